//! Output formatting for search results: `title(category[/arch]) - description`

use crate::query::candidates::Candidate;
use std::cmp::Ordering;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print matched candidates sorted by title
pub fn print_matches<'a, I>(matches: I, color: bool) -> io::Result<usize>
where
    I: IntoIterator<Item = &'a Candidate>,
{
    let choice = if color { ColorChoice::Auto } else { ColorChoice::Never };
    let mut stdout = StandardStream::stdout(choice);
    write_matches(&mut stdout, matches)
}

/// Write matched candidates sorted by title; returns how many were written
pub fn write_matches<'a, W, I>(out: &mut W, matches: I) -> io::Result<usize>
where
    W: WriteColor,
    I: IntoIterator<Item = &'a Candidate>,
{
    let mut sorted: Vec<&Candidate> = matches.into_iter().collect();
    sorted.sort_by(|a, b| by_title(a, b));

    for candidate in &sorted {
        write_match(out, candidate)?;
    }
    Ok(sorted.len())
}

fn by_title(a: &Candidate, b: &Candidate) -> Ordering {
    let (a, b) = (&a.record, &b.record);
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.arch.cmp(&b.arch))
}

fn write_match<W: WriteColor>(out: &mut W, candidate: &Candidate) -> io::Result<()> {
    let record = &candidate.record;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(out, "{}", record.title)?;
    out.reset()?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    if record.arch.is_empty() {
        write!(out, "({})", record.category)?;
    } else {
        write!(out, "({}/{})", record.category, record.arch)?;
    }
    out.reset()?;

    writeln!(out, " - {}", record.description)
}
