use console::Style;
use std::path::Path;

use crate::filter::FilterReport;
use crate::mutants::MutationDescriptor;
use crate::registry::OperatorRegistry;

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_success(msg: &str) {
    let style = Style::new().green().bold();
    println!("{} {}", style.apply_to("✓"), msg);
}

pub fn print_filter_report(report: &FilterReport, session: &Path) {
    let total = report.kept.len() + report.skipped.len();
    if report.skipped.is_empty() {
        print_success(&format!(
            "{}: {} pending jobs, all covered",
            session.display(),
            total
        ));
        return;
    }

    let style = Style::new().yellow().bold();
    println!(
        "{} {}: {} skipped / {} pending, {} left to run",
        style.apply_to("!"),
        session.display(),
        report.skipped.len(),
        total,
        report.kept.len(),
    );

    println!();
    let id_style = Style::new().cyan();
    let reason_style = Style::new().dim();
    for skipped in &report.skipped {
        let m = &skipped.mutation;
        println!(
            "  {} {}:{} {} {}",
            id_style.apply_to(short_id(&skipped.job_id)),
            m.module_path,
            m.start_pos.line,
            reason_style.apply_to(format!("[{}]", skipped.reason)),
            m.operator_name,
        );
    }
}

pub fn print_mutations(mutations: &[MutationDescriptor], file: &Path) {
    if mutations.is_empty() {
        print_success(&format!("{}: no mutable code found.", file.display()));
        return;
    }
    println!("{}: {} mutations", file.display(), mutations.len());
    let op_style = Style::new().magenta();
    let loc_style = Style::new().dim();
    for m in mutations {
        println!(
            "  {} #{} {}",
            op_style.apply_to(&m.operator_name),
            m.occurrence,
            loc_style.apply_to(format!("{}..{}", m.start_pos, m.end_pos)),
        );
    }
}

pub fn print_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with('-') {
            let del_style = Style::new().red();
            println!("  {}", del_style.apply_to(line));
        } else if line.starts_with('+') {
            let add_style = Style::new().green();
            println!("  {}", add_style.apply_to(line));
        }
    }
}

pub fn print_operators(registry: &OperatorRegistry) {
    let name_style = Style::new().cyan().bold();
    let dim = Style::new().dim();
    for (name, op) in registry.iter() {
        println!("{}", name_style.apply_to(name));
        for example in op.examples() {
            for line in example.source.lines() {
                println!("  {}", dim.apply_to(line));
            }
            println!("  {}", dim.apply_to("=>"));
            for line in example.mutated.lines() {
                println!("  {}", line);
            }
            println!();
        }
    }
}

fn short_id(job_id: &str) -> &str {
    job_id.get(..8).unwrap_or(job_id)
}
