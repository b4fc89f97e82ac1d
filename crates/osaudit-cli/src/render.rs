//! Human-readable and JSON rendering of an [`AuditReport`].

use std::io::{self, Write};

use osaudit_core::{AuditReport, CheckId, ResultRecord};

/// Process exit codes.
pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURES: u8 = 1;
pub const EXIT_ERRORS: u8 = 2;
pub const EXIT_INFRA: u8 = 3;

pub fn exit_code(report: &AuditReport) -> u8 {
    if report.summary.has_failures() {
        EXIT_FAILURES
    } else if report.summary.has_errors() {
        EXIT_ERRORS
    } else {
        EXIT_OK
    }
}

enum Row<'a> {
    Banner(&'a CheckId, &'a str),
    Check(&'a ResultRecord),
}

impl Row<'_> {
    fn id(&self) -> &CheckId {
        match self {
            Row::Banner(id, _) => *id,
            Row::Check(record) => &record.id,
        }
    }
}

/// Banners and records interleaved in id order.
fn rows(report: &AuditReport) -> Vec<Row<'_>> {
    let mut rows: Vec<Row<'_>> = report
        .sections
        .iter()
        .map(|s| Row::Banner(&s.id, s.title.as_str()))
        .chain(report.records.iter().map(Row::Check))
        .collect();
    // Banners sort before a check with the same id.
    rows.sort_by(|a, b| {
        a.id()
            .cmp(b.id())
            .then_with(|| matches!(b, Row::Banner(..)).cmp(&matches!(a, Row::Banner(..))))
    });
    rows
}

pub fn render_text(report: &AuditReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", report.benchmark)?;
    writeln!(
        out,
        "run {}  started {}",
        report.run_id,
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    for row in rows(report) {
        match row {
            Row::Banner(id, title) => {
                if id.depth() == 1 {
                    writeln!(out)?;
                }
                writeln!(out, "{}{id} {title}", "  ".repeat(id.depth() - 1))?;
            }
            Row::Check(record) => {
                writeln!(
                    out,
                    "[{:<5}] {} {} (Level {}, {})",
                    record.status_label(),
                    record.id,
                    record.description,
                    record.level,
                    record.scoring_class,
                )?;
                if record.status_label() != "PASS" {
                    if let Some(detail) = &record.detail {
                        writeln!(out, "        {detail}")?;
                    }
                }
            }
        }
    }

    let s = &report.summary;
    writeln!(out)?;
    writeln!(
        out,
        "Total: {}  Passed: {}  Failed: {}  Errors: {}  Skipped: {}  Pass rate: {:.1}%  Elapsed: {:.2}s",
        s.total,
        s.passed,
        s.failed,
        s.errored,
        s.skipped,
        s.pass_rate * 100.0,
        s.elapsed_ms as f64 / 1000.0,
    )
}

pub fn render_json(report: &AuditReport, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "{}", report.to_json_pretty()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use osaudit_core::{CheckSpec, Finding, Level, ReportSummary, ScoringClass, Section};

    fn spec(id: &str, title: &str) -> CheckSpec {
        CheckSpec::new(CheckId::parse(id).unwrap(), Level::One, ScoringClass::Scored, title)
    }

    fn records() -> Vec<ResultRecord> {
        vec![
            ResultRecord::from_finding(&spec("1.1.1", "cramfs disabled"), Finding::pass(), 1),
            ResultRecord::from_finding(
                &spec("1.1.2", "udf disabled"),
                Finding::fail("udf is currently loaded"),
                1,
            ),
        ]
    }

    fn report(records: Vec<ResultRecord>) -> AuditReport {
        let now = Utc::now();
        AuditReport {
            run_id: "run-1".into(),
            benchmark: "Test Benchmark".into(),
            started_at: now,
            finished_at: now,
            sections: vec![
                Section {
                    id: CheckId::parse("1").unwrap(),
                    title: "Initial Setup".into(),
                },
                Section {
                    id: CheckId::parse("1.1").unwrap(),
                    title: "Filesystem".into(),
                },
            ],
            summary: ReportSummary::from_records(&records, 1500),
            records,
        }
    }

    #[test]
    fn test_text_rendering_interleaves_banners() {
        let report = report(records());
        let mut buf = Vec::new();
        render_text(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let banner = text.find("1 Initial Setup").unwrap();
        let sub = text.find("  1.1 Filesystem").unwrap();
        let pass = text.find("[PASS ] 1.1.1 cramfs disabled").unwrap();
        let fail = text.find("[FAIL ] 1.1.2 udf disabled").unwrap();
        assert!(banner < sub && sub < pass && pass < fail);
        assert!(text.contains("udf is currently loaded"));
        assert!(text.contains("Total: 2  Passed: 1  Failed: 1  Errors: 0  Skipped: 0"));
        assert!(text.contains("Elapsed: 1.50s"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&report(records())), EXIT_FAILURES);
        assert_eq!(exit_code(&report(vec![])), EXIT_OK);
    }

    #[test]
    fn test_json_rendering() {
        let mut buf = Vec::new();
        render_json(&report(records()), &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["records"][1]["outcome"], "fail");
        assert_eq!(value["summary"]["failed"], 1);
    }
}
