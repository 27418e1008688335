//! Define our own macros to simplify the code
//!

/// Call the HTTP client with the proper arguments
///
/// - plain GET with our user-agent
///
#[macro_export]
macro_rules! http_get {
    ($self:ident, $url:expr) => {
        $self
            .client
            .get($url)
            .header(
                "user-agent",
                format!("{}/{}", crate_name!(), crate_version!()),
            )
            .header("accept", "*/*")
            .send()
    };
}

/// Call the HTTP client with the proper arguments
///
/// - GET with the `Origin`/`Referer` pair some SHOM endpoints refuse to
///   answer without
///
#[macro_export]
macro_rules! http_get_referred {
    ($self:ident, $url:expr, $origin:expr) => {
        $self
            .client
            .get($url)
            .header(
                "user-agent",
                format!("{}/{}", crate_name!(), crate_version!()),
            )
            .header("accept", "*/*")
            .header("origin", $origin)
            .header("referer", format!("{}/", $origin))
            .send()
    };
}
