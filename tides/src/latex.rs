//! LaTeX rendering of the almanac.
//!
//! Three products out of the same data: a per-harbor strip of daily
//! tide tables, a complete `nav` document with one strip per leg, and
//! a pgfplots water-level curve.  Output is plain text, compiling it
//! is the caller's business.
//!

use chrono::{Duration, NaiveDate};

use estran_sources::{TideEvent, WaterLevels};

use crate::SunTimes;

/// One day of almanac.
///
#[derive(Clone, Debug)]
pub struct DayTide {
    pub date: NaiveDate,
    pub events: Vec<TideEvent>,
    pub sun: SunTimes,
}

/// One harbor over consecutive days.
///
#[derive(Clone, Debug)]
pub struct HarborStrip {
    /// Displayed name
    pub harbor: String,
    /// Oceanogramme page, linked from the sidebar
    pub url: String,
    pub days: Vec<DayTide>,
}

/// Line accumulator, same shape whatever the product.
///
#[derive(Debug, Default)]
pub struct TexDoc {
    lines: Vec<String>,
}

impl TexDoc {
    pub fn new() -> Self {
        TexDoc::default()
    }

    pub fn add(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

fn fmt_time(e: &TideEvent) -> String {
    match e.time {
        Some(t) => t.to_string(),
        _ => "--:--".to_string(),
    }
}

fn fmt_height(e: &TideEvent) -> String {
    match e.height {
        Some(h) => format!("{h:.2}"),
        _ => "---".to_string(),
    }
}

fn fmt_coeff(e: &TideEvent) -> String {
    match e.coeff {
        Some(c) => c.to_string(),
        _ => "---".to_string(),
    }
}

/// One day table.  The first day of a strip carries the harbor sidebar
/// and a wider column layout.
///
fn day(doc: &mut TexDoc, strip: &HarborStrip, day: &DayTide, show_harbor: bool) {
    let date = day.date.format("%a %Y-%m-%d");

    if show_harbor {
        doc.add(r"\begin{tabular}{|c|c c c c|}\hline");
        doc.add(r"\multirow{6}{1.8em}{\rotatebox[origin=c]{90}{");
        doc.add(&format!(
            r"\parbox[c]{{1.5cm}}{{\centering \href{{{}}}{{{}}}}}}}}}",
            strip.url, strip.harbor
        ));
        doc.add(&format!(r"& \multicolumn{{4}}{{c|}}{{{date}}} \\"));
        doc.add(r"\cline{2-5}");
    } else {
        doc.add(r"\begin{tabular}{|c c c c|}\hline");
        doc.add(&format!(r"\multicolumn{{4}}{{|c|}}{{{date}}} \\"));
        doc.add(r"\hline");
    }

    let sep = if show_harbor { "& " } else { "" };
    for e in &day.events {
        doc.add(&format!(
            r"{}{} & {} & {} & {} \\",
            sep,
            e.kind,
            fmt_time(e),
            fmt_height(e),
            fmt_coeff(e),
        ));
    }

    if show_harbor {
        doc.add(r"\cline{2-5}");
    } else {
        doc.add(r"\cline{1-4}");
    }
    doc.add(&format!(
        r"{}Lever & {} & Coucher & {} \\",
        sep, day.sun.rise, day.sun.set,
    ));
    doc.add(r"\hline\end{tabular}");
}

/// A strip of consecutive day tables for one harbor.
///
pub fn strip(doc: &mut TexDoc, data: &HarborStrip) {
    doc.add(&format!(
        r"\begin{{tabular}}{{{}}}",
        "c ".repeat(data.days.len())
    ));

    for (i, d) in data.days.iter().enumerate() {
        if i > 0 {
            doc.add("&");
        }
        day(doc, data, d, i == 0);
    }
    doc.add(r"\\");
    doc.add(r"\end{tabular}");
}

/// The full nav document, one strip per leg.
///
pub fn nav(strips: &[HarborStrip]) -> String {
    let mut doc = TexDoc::new();
    doc.add(
        r"\documentclass{article}
\usepackage{tgbonum}
\usepackage{geometry}
\geometry{
a4paper,
total={190mm,277mm},
left=10mm,
top=10mm,
}
\usepackage{pgfplots}
\pgfplotsset{compat = newest}
\usepgfplotslibrary{dateplot}
\usepackage{multirow}
\usepackage{rotating}
\usepackage{pgfplots, pgfplotstable}
\usepackage{longtable}
\usepackage{hyperref}

\setlength\parindent{0pt}
\pagenumbering{gobble}

\setlength\LTleft{0pt}
\setlength\LTright{0pt}

\begin{document}",
    );

    doc.add(r"\begin{longtable}{l}");
    for (i, s) in strips.iter().enumerate() {
        if i > 0 {
            doc.add(r"\\");
        }
        strip(&mut doc, s);
        doc.add(r"\\");
    }
    doc.add(r"\\");
    doc.add(r"\end{longtable}");
    doc.add(r"\end{document}");
    doc.render()
}

/// Water-level curve over `count` days starting at `start`, one
/// `(date, levels)` pair per day.
///
pub fn plot(
    start: NaiveDate,
    count: i64,
    levels: &[(NaiveDate, WaterLevels)],
    standalone: bool,
) -> String {
    let mut doc = TexDoc::new();

    if standalone {
        doc.add(
            r"\documentclass{standalone}
\usepackage{pgfplots}
\pgfplotsset{compat = newest}
\usepgfplotslibrary{dateplot}
\usepackage{multirow}
\usepackage{rotating}
\usepackage{pgfplots, pgfplotstable}

\begin{document}",
        );
    }

    let end = start + Duration::days(count);
    doc.add(&format!(
        r"\begin{{tikzpicture}}
\begin{{axis}}[
    xmin = {} 00:00:00, xmax = {} 00:00:00,
    date coordinates in=x,
    xtick distance = 0.125,
    xticklabel style={{rotate=90}},
    xticklabel={{\hour:\minute}},
    ymin = 0, ymax = 10.0,
    ytick distance = 1,
    grid = both,
    minor tick num = 1,
    major grid style = {{lightgray}},
    minor grid style = {{lightgray!25}},
    width = \textwidth,
    height = 0.5\textwidth,]",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
    ));

    doc.add(
        r"\addplot[
    smooth,
    thin,
    red,
    dashed
]  coordinates {",
    );
    for (date, wl) in levels {
        for (time, height) in wl {
            doc.add(&format!(
                "({} {:02}:{:02}, {})",
                date.format("%Y-%m-%d"),
                time.hh,
                time.mm,
                height,
            ));
        }
    }
    doc.add("};");

    // Midnight separators between days
    for d in 1..count {
        let date = start + Duration::days(d);
        doc.add(&format!(
            r"\addplot[mark=none, draw=blue, line width=1pt] coordinates {{ ({date} 00:00:00, 0) ({date} 00:00:00, 10) }};",
            date = date.format("%Y-%m-%d"),
        ));
    }

    doc.add(r"\end{axis}");
    doc.add(r"\end{tikzpicture}");
    if standalone {
        doc.add(r"\end{document}");
    }
    doc.render()
}

#[cfg(test)]
mod tests {
    use estran_common::HourMinute;
    use estran_sources::TideKind;

    use super::*;

    fn sample_day(d: u32) -> DayTide {
        DayTide {
            date: NaiveDate::from_ymd_opt(2026, 8, 28 + d).unwrap(),
            events: vec![
                TideEvent {
                    kind: TideKind::Low,
                    time: Some(HourMinute::new(4, 7)),
                    height: Some(1.55),
                    coeff: None,
                },
                TideEvent {
                    kind: TideKind::High,
                    time: Some(HourMinute::new(9, 58)),
                    height: Some(6.9),
                    coeff: Some(82),
                },
            ],
            sun: SunTimes {
                rise: "07:21".to_string(),
                set: "20:42".to_string(),
            },
        }
    }

    fn sample_strip() -> HarborStrip {
        HarborStrip {
            harbor: "Brest".to_string(),
            url: "https://services.data.shom.fr/oceano/render/html?duration=4&delta-date=0&spot=BREST&lang=fr".to_string(),
            days: vec![sample_day(1), sample_day(2)],
        }
    }

    #[test]
    fn test_strip() {
        let mut doc = TexDoc::new();
        strip(&mut doc, &sample_strip());
        let txt = doc.render();

        assert!(txt.contains(r"\begin{tabular}{c c }"));
        // First day has the sidebar, second does not
        assert!(txt.contains(r"\begin{tabular}{|c|c c c c|}\hline"));
        assert!(txt.contains(r"\begin{tabular}{|c c c c|}\hline"));
        assert!(txt.contains(r"\href{"));
        assert!(txt.contains("Brest"));
        assert!(txt.contains(r"& PM & 09h58 & 6.90 & 82 \\"));
        assert!(txt.contains(r"BM & 04h07 & 1.55 & --- \\"));
        assert!(txt.contains(r"& Lever & 07:21 & Coucher & 20:42 \\"));
    }

    #[test]
    fn test_nav_document() {
        let txt = nav(&[sample_strip()]);
        assert!(txt.starts_with(r"\documentclass{article}"));
        assert!(txt.contains(r"\begin{longtable}{l}"));
        assert!(txt.contains(r"\usepackage{hyperref}"));
        assert!(txt.ends_with(r"\end{document}"));
    }

    #[test]
    fn test_plot() {
        let start = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let levels = vec![
            (
                start,
                vec![
                    (HourMinute::new(0, 0), 5.12),
                    (HourMinute::new(0, 5), 5.01),
                ],
            ),
            (
                start + Duration::days(1),
                vec![(HourMinute::new(0, 0), 4.2)],
            ),
        ];

        let txt = plot(start, 2, &levels, true);
        assert!(txt.starts_with(r"\documentclass{standalone}"));
        assert!(txt.contains("xmin = 2026-08-29 00:00:00, xmax = 2026-08-31 00:00:00"));
        assert!(txt.contains("(2026-08-29 00:05, 5.01)"));
        assert!(txt.contains("(2026-08-30 00:00, 4.2)"));
        // One midnight separator between the two days
        assert!(txt.contains("({date} 00:00:00, 0)".replace("{date}", "2026-08-30").as_str()));
    }

    #[test]
    fn test_padding_row() {
        let mut d = sample_day(1);
        d.events.push(TideEvent {
            kind: TideKind::None,
            time: None,
            height: None,
            coeff: None,
        });
        let s = HarborStrip {
            harbor: "Brest".to_string(),
            url: "x".to_string(),
            days: vec![d],
        };
        let mut doc = TexDoc::new();
        strip(&mut doc, &s);
        assert!(doc.render().contains(r"& -- & --:-- & --- & --- \\"));
    }
}
