//! Result report line formatting.
//!
//! One place builds every line of the sterilization report, so the file
//! and printer drains are byte-identical by construction. Timestamps are
//! milliseconds since local midnight; temperatures are raw sensor counts
//! converted to degrees Celsius at the formatting boundary.

use core::fmt::Write as _;

use crate::app::ports::DateStamp;
use crate::buffer::ReportLine;
use crate::config::TEMP_QUANTUM;
use crate::sensors::TemperatureSample;

/// Split milliseconds-since-midnight into (h, m, s).
pub fn hms(ms: u32) -> (u32, u32, u32) {
    let sec = ms / 1000;
    (sec / 3600, sec % 3600 / 60, sec % 3600 % 60)
}

/// `Date: <y>.<mm>.<dd>\nStart: <hh>:<mm>:<ss>\n`
pub fn header(date: DateStamp, start_ms: u32) -> ReportLine {
    let (h, m, s) = hms(start_ms);
    let mut line = ReportLine::new();
    let _ = write!(
        line,
        "Date: {}.{:02}.{:02}\nStart: {:02}:{:02}:{:02}\n",
        date.year, date.month, date.day, h, m, s,
    );
    line
}

/// Column captions above the result rows.
pub fn column_header() -> ReportLine {
    let mut line = ReportLine::new();
    let _ = line.push_str("Nr.\tTime\t\tCH0\tCH1\tCH2\tStatus\n");
    line
}

/// One result row: sequence, time of day, three temperatures, status.
pub fn result_line(seq: usize, sample: &TemperatureSample) -> ReportLine {
    let (h, m, s) = hms(sample.timestamp_ms);
    let c = |raw: i16| f32::from(raw) * TEMP_QUANTUM;
    let status = if sample.sterile { "Sterile" } else { "Failure" };
    let mut line = ReportLine::new();
    let _ = write!(
        line,
        "{:02}\t{:02}:{:02}:{:02}\t{:.1} C\t{:.1} C\t{:.1} C\t{}\n",
        seq,
        h,
        m,
        s,
        c(sample.temp[0]),
        c(sample.temp[1]),
        c(sample.temp[2]),
        status,
    );
    line
}

/// `End: <hh>:<mm>:<ss>\nResult: <SUCCESS|FAILURE>\n`
pub fn footer(end_ms: u32, success: bool) -> ReportLine {
    let (h, m, s) = hms(end_ms);
    let verdict = if success { "SUCCESS" } else { "FAILURE" };
    let mut line = ReportLine::new();
    let _ = write!(line, "End: {:02}:{:02}:{:02}\nResult: {}\n", h, m, s, verdict);
    line
}

/// `<dir>/<y>_<mm>_<dd>_<hh>_<mm>_<ss>.txt`
pub fn result_file_name(dir: &str, date: DateStamp, start_ms: u32) -> ReportLine {
    let (h, m, s) = hms(start_ms);
    let mut name = ReportLine::new();
    let _ = write!(
        name,
        "{}/{}_{:02}_{:02}_{:02}_{:02}_{:02}.txt",
        dir, date.year, date.month, date.day, h, m, s,
    );
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CHANNEL_COUNT;

    fn date() -> DateStamp {
        DateStamp { year: 2024, month: 3, day: 9 }
    }

    #[test]
    fn hms_splits_a_day_correctly() {
        assert_eq!(hms(0), (0, 0, 0));
        assert_eq!(hms(45_296_000), (12, 34, 56));
        assert_eq!(hms(86_399_999), (23, 59, 59));
    }

    #[test]
    fn header_matches_fixed_format() {
        let line = header(date(), 45_296_000);
        assert_eq!(line.as_str(), "Date: 2024.03.09\nStart: 12:34:56\n");
    }

    #[test]
    fn result_line_formats_temperatures_and_status() {
        let sample = TemperatureSample {
            timestamp_ms: 3_723_000, // 01:02:03
            temp: [14_592; CHANNEL_COUNT],
            dtemp: [0; CHANNEL_COUNT],
            sterile: true,
        };
        let line = result_line(5, &sample);
        assert_eq!(
            line.as_str(),
            "05\t01:02:03\t114.0 C\t114.0 C\t114.0 C\tSterile\n"
        );

        let failing = TemperatureSample { sterile: false, ..sample };
        assert!(result_line(60, &failing).ends_with("Failure\n"));
    }

    #[test]
    fn footer_reports_both_verdicts() {
        assert_eq!(footer(7_200_000, true).as_str(), "End: 02:00:00\nResult: SUCCESS\n");
        assert_eq!(footer(0, false).as_str(), "End: 00:00:00\nResult: FAILURE\n");
    }

    #[test]
    fn file_name_embeds_date_and_time() {
        let name = result_file_name("/results", date(), 45_296_000);
        assert_eq!(name.as_str(), "/results/2024_03_09_12_34_56.txt");
    }
}
