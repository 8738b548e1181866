//! Signal and content type listings

use clap::ValueEnum;

use sigex_core::Settings;

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ListAction {
    List,
}

pub fn execute_signal(
    action: ListAction,
    settings: &Settings<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ListAction::List => print_sorted(
            settings
                .signal_types()
                .signal_types()
                .iter()
                .map(|s| (s.name.as_str(), s.qualified_name.as_str())),
        ),
    }
    Ok(())
}

pub fn execute_content(
    action: ListAction,
    settings: &Settings<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ListAction::List => print_sorted(
            settings
                .signal_types()
                .content_types()
                .iter()
                .map(|c| (c.name.as_str(), c.qualified_name.as_str())),
        ),
    }
    Ok(())
}

fn print_sorted<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) {
    let mut entries: Vec<_> = entries.collect();
    entries.sort_unstable();
    for (name, qualified_name) in entries {
        println!("{name} {qualified_name}");
    }
}
