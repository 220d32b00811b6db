//! Plain-text rendering of a report cycle for the terminal

use std::fmt::Write;

use crate::ml_engine::render_report;
use crate::types::{CycleOutcome, MachineReport, Reading, ReportCycle, TrainingOutcome};

/// Render a cycle outcome, listing up to `detail_rows` readings per machine
pub fn render(outcome: &CycleOutcome, detail_rows: usize) -> String {
    match outcome {
        CycleOutcome::NoData { filter, generation } => {
            let mut out = String::new();
            if let Some(g) = generation {
                let _ = writeln!(
                    out,
                    "{} of {} synthetic readings inserted",
                    g.inserted, g.requested
                );
            }
            let _ = writeln!(
                out,
                "No readings found for {} between {} and {}.",
                filter.machine_ids.join(", "),
                filter.start,
                filter.end
            );
            out
        }
        CycleOutcome::Completed(cycle) => render_cycle(cycle, detail_rows),
    }
}

fn render_cycle(cycle: &ReportCycle, detail_rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== Wave soldering report: {} | {} to {} ===",
        cycle.filter.machine_ids.join(", "),
        cycle.filter.start,
        cycle.filter.end
    );
    if let Some(g) = &cycle.generation {
        let _ = writeln!(out, "{} of {} synthetic readings inserted", g.inserted, g.requested);
    }
    let _ = writeln!(out, "{} readings in range", cycle.readings.len());

    for machine in &cycle.machines {
        out.push('\n');
        render_machine(&mut out, machine, cycle, detail_rows);
    }

    if !cycle.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &cycle.warnings {
            let _ = writeln!(out, "  - {}", w);
        }
    }
    out
}

fn render_machine(
    out: &mut String,
    machine: &MachineReport,
    cycle: &ReportCycle,
    detail_rows: usize,
) {
    let s = &machine.summary;
    let _ = writeln!(out, "--- Machine {} ---", machine.machine_id);
    let _ = write!(
        out,
        "Critical rate:        {:.1}% ({} of {})",
        s.critical_rate, s.critical_count, s.reading_count
    );
    match s.expectation_delta {
        Some(delta) => {
            let _ = writeln!(out, "  [{:.1}% above expectation]", delta);
        }
        None => out.push('\n'),
    }
    let _ = writeln!(out, "Mean sensor temp:     {:.2} °C", s.mean_sensor_temp);
    let _ = writeln!(out, "Mean vibration:       {:.2} m/s²", s.mean_vibration);
    let _ = writeln!(
        out,
        "Mean solder time:     {:.2} s actual / {:.2} s standard",
        s.mean_actual_solder_time, s.mean_standard_solder_time
    );

    match &machine.training {
        TrainingOutcome::Trained(model) => {
            let _ = writeln!(
                out,
                "Model accuracy:       {:.1}% ({} train / {} test rows)",
                model.accuracy * 100.0,
                model.train_rows,
                model.test_rows
            );
            out.push('\n');
            out.push_str(&render_report(&model.report));
        }
        TrainingOutcome::Skipped(reason) => {
            let _ = writeln!(out, "Model accuracy:       n/a ({})", reason);
        }
    }

    if detail_rows > 0 {
        out.push('\n');
        let rows: Vec<&Reading> = cycle
            .readings
            .iter()
            .filter(|r| r.machine_id() == machine.machine_id)
            .take(detail_rows)
            .collect();
        render_rows(out, &rows);
    }
}

fn render_rows(out: &mut String, rows: &[&Reading]) {
    let _ = writeln!(
        out,
        "{:<20} {:<6} {:>8} {:>6} {:>6} {:>7} {:>7} {:<8}  {}",
        "timestamp", "batch", "sensor", "vib", "visual", "std_s", "real_s", "status", "note"
    );
    for r in rows {
        let _ = writeln!(
            out,
            "{:<20} {:<6} {:>8.2} {:>6.2} {:>6} {:>7.2} {:>7.2} {:<8}  {}",
            r.timestamp().format("%Y-%m-%d %H:%M:%S"),
            r.batch_id(),
            r.sensor_temp(),
            r.vibration(),
            r.visual_inspection().as_str(),
            r.standard_solder_time(),
            r.actual_solder_time(),
            r.status().as_str(),
            r.note()
        );
    }
}
