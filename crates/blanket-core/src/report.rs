//! The human-readable per-deployment report ("golden nugget").

use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::deployment::DeploymentExtract;
use crate::outputs::{SensorSource, SensorSources};

const RULE: &str = "--------------------------------------------------------";

pub fn render_report(extract: &DeploymentExtract<'_>, sources: &SensorSources) -> String {
    let deployment = &extract.deployment;
    let row = &deployment.row;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "----------------------- Begin Header ---------------------");
    let _ = writeln!(out, " Blanket Letter             : {} ", row.blanket_letter);
    let _ = writeln!(out, " Blanket Deployment         : {} ", row.base_name());
    let _ = writeln!(out, " ");
    write_sensor_block(&mut out, "Bottom", &sources.bottom);
    let _ = writeln!(out, " ");
    write_sensor_block(&mut out, "Top", &sources.top);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, " Deployment Location Information");
    let _ = writeln!(out, " Lon [deg]     : {} ", whole_degrees(row.longitude.degrees));
    let _ = writeln!(out, " Lon [dec-min] : {:.6} ", row.longitude.minutes);
    let _ = writeln!(out, " Lat [deg]     : {} ", whole_degrees(row.latitude.degrees));
    let _ = writeln!(out, " Lat [dec-min] : {:.6} ", row.latitude.minutes);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, " Deployment Time Information");
    let _ = writeln!(
        out,
        " Date/Time Deployed  : {} ",
        event_stamp(&deployment.deployed_at)
    );
    let _ = writeln!(
        out,
        " Date/Time Recovered : {} ",
        event_stamp(&deployment.recovered_at)
    );
    let _ = writeln!(out, "-------------------------- End Header -------------------");
    let _ = writeln!(out, " ");
    let _ = writeln!(
        out,
        "  Date-Time              Bottom   Bottom    Bottom    Bottom    Top      Top        Top      Top"
    );
    let _ = writeln!(
        out,
        "                         [raw]    [ohm]      T[C]    T(offset) [raw]    [ohm]       T[C]   T(offset)"
    );

    for (top, bottom) in extract.pairs() {
        let stamp = &top.record;
        let _ = writeln!(
            out,
            "{}-{}-{:>5} {:02}:{:02}:{:02}     {:5.0}  {:5.4}   {:.4}   {:.4}   {:5.0}  {:5.4}   {:.4}   {:.4}",
            stamp.day,
            month_abbrev(stamp.year, stamp.month),
            stamp.year,
            stamp.hour,
            stamp.minute,
            stamp.second,
            bottom.record.raw_count,
            bottom.record.resistance_ohm,
            bottom.record.temperature_c,
            bottom.corrected_temperature_c,
            top.record.raw_count,
            top.record.resistance_ohm,
            top.record.temperature_c,
            top.corrected_temperature_c,
        );
    }

    out
}

fn write_sensor_block(out: &mut String, position: &str, source: &SensorSource) {
    let offset = match source.offset {
        Some(offset) => format!("{offset:.4}"),
        None => "missing".to_string(),
    };
    let label = format!("{position} Thermistor");
    let _ = writeln!(out, " {:<26} : {} ", format!("{label} ID"), source.sensor_id);
    let _ = writeln!(
        out,
        " {:<26} : {} ",
        format!("{label} Filename"),
        source.path.display()
    );
    let _ = writeln!(out, " {:<26} : {} [deg C] ", format!("{label} Offset"), offset);
}

/// Integer degrees; a `-0` field prints as `0`.
fn whole_degrees(degrees: f64) -> i64 {
    degrees.trunc() as i64
}

/// `D-Mon-YYYY HH:MM:00` with space-padded clock fields.
fn event_stamp(at: &NaiveDateTime) -> String {
    format!(
        "{}-{}-{} {:>2}:{:>2}:00",
        at.day(),
        at.format("%b"),
        at.year(),
        at.hour(),
        at.minute()
    )
}

fn month_abbrev(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%b").to_string())
        .unwrap_or_else(|| format!("M{month:02}"))
}
