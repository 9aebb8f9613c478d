//! Terminal and JSON rendering of search results

use crate::query::{Node, Predicate, TopicHit, Warning};
use serde::Serialize;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn color_choice(color: bool) -> ColorChoice {
    if color { ColorChoice::Auto } else { ColorChoice::Never }
}

pub fn stdout(color: bool) -> StandardStream {
    StandardStream::stdout(color_choice(color))
}

/// Print hits, one topic per line
pub fn print_hits(hits: &[TopicHit], color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);
    write_hits(&mut stdout, hits)
}

pub fn write_hits<W: WriteColor>(out: &mut W, hits: &[TopicHit]) -> io::Result<()> {
    for hit in hits {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{:>6}", hit.id)?;
        out.reset()?;
        write!(out, "  ")?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(out, "{}", hit.last_message_at.format("%Y-%m-%d"))?;
        out.reset()?;
        write!(out, "  ")?;

        out.set_color(ColorSpec::new().set_bold(true))?;
        write!(out, "{}", hit.title)?;
        out.reset()?;
        writeln!(out, " ({} messages)", hit.message_count)?;
    }
    Ok(())
}

/// Print warnings as banners on stderr
pub fn print_warnings(warnings: &[Warning], color: bool) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(color_choice(color));
    write_warnings(&mut stderr, warnings)
}

pub fn write_warnings<W: WriteColor>(out: &mut W, warnings: &[Warning]) -> io::Result<()> {
    for warning in warnings {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        write!(out, "warning")?;
        out.reset()?;
        writeln!(out, ": {}", warning)?;
    }
    Ok(())
}

/// Print the validated tree (or a placeholder when nothing survived)
pub fn write_ast<W: WriteColor>(out: &mut W, ast: Option<&Node>) -> io::Result<()> {
    match ast {
        Some(node) => writeln!(out, "{}", node),
        None => {
            out.set_color(ColorSpec::new().set_dimmed(true))?;
            write!(out, "(empty query)")?;
            out.reset()?;
            writeln!(out)
        }
    }
}

pub fn write_predicate<W: WriteColor>(out: &mut W, predicate: &Predicate) -> io::Result<()> {
    writeln!(out, "{}", predicate)
}

pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, value)?;
    writeln!(lock)
}
