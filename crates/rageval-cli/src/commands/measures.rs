//! The `rageval measures` command.

use anyhow::Result;

use rageval_core::MeasureRegistry;

pub fn execute() -> Result<()> {
    use comfy_table::{Cell, Table};

    let registry = MeasureRegistry::standard();

    let mut table = Table::new();
    table.set_header(vec!["Measure", "Aliases", "Name", "Description"]);
    for entry in registry.entries() {
        table.add_row(vec![
            Cell::new(entry.measure),
            Cell::new(entry.aliases.join(", ")),
            Cell::new(entry.measure.pretty_name()),
            Cell::new(entry.measure.short_desc()),
        ]);
    }

    println!("{table}");
    Ok(())
}
