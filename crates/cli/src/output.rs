//! What `wodman` prints.
//!
//! Results go to stdout, one line each, led by a colored marker. Failures and
//! warnings go to stderr so that `wodman up | tail -1` yields the endpoint.
//! Markers are only colored when the target stream supports it.

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

/// `--output` for the reporting commands.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  /// Aligned `label: value` lines.
  #[default]
  Text,
  /// Pretty-printed JSON on stdout.
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
  Done,
  Failed,
  Caution,
  Note,
  Endpoint,
}

impl Tone {
  fn marker(self) -> &'static str {
    match self {
      Tone::Done => "✓",
      Tone::Failed => "✗",
      Tone::Caution => "⚠",
      Tone::Note => "•",
      Tone::Endpoint => "→",
    }
  }
}

fn paint(text: &str, tone: Tone, stream: Stream) -> String {
  text
    .if_supports_color(stream, |t| match tone {
      Tone::Done => t.green().to_string(),
      Tone::Failed => t.red().to_string(),
      Tone::Caution => t.yellow().to_string(),
      Tone::Note => t.blue().to_string(),
      Tone::Endpoint => t.cyan().to_string(),
    })
    .to_string()
}

/// Wall time of an import: `850ms`, `12.3s`, `2m05s`.
pub fn format_elapsed(elapsed: Duration) -> String {
  let millis = elapsed.as_millis();
  match millis {
    0..1_000 => format!("{millis}ms"),
    1_000..60_000 => format!("{:.1}s", elapsed.as_secs_f64()),
    _ => {
      let secs = elapsed.as_secs();
      format!("{}m{:02}s", secs / 60, secs % 60)
    }
  }
}

pub fn yes_no(value: bool) -> &'static str {
  if value { "yes" } else { "no" }
}

/// Distro names joined with `, `; `(none)` when empty.
pub fn format_list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
  let joined = items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ");
  if joined.is_empty() { "(none)".to_string() } else { joined }
}

pub fn print_success(message: &str) {
  println!("{} {message}", paint(Tone::Done.marker(), Tone::Done, Stream::Stdout));
}

pub fn print_info(message: &str) {
  println!("{} {message}", paint(Tone::Note.marker(), Tone::Note, Stream::Stdout));
}

/// Whole line in red on stderr, including the cause chain.
pub fn print_error(message: &str) {
  let line = format!("{} {message}", Tone::Failed.marker());
  eprintln!("{}", paint(&line, Tone::Failed, Stream::Stderr));
}

pub fn print_warning(message: &str) {
  let line = format!("{} {message}", Tone::Caution.marker());
  eprintln!("{}", paint(&line, Tone::Caution, Stream::Stderr));
}

/// Indented `label: value` row for status and config reports.
pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()));
}

/// The service endpoint, last line of `wodman up`.
pub fn print_endpoint(endpoint: &str) {
  println!(
    "{} {}",
    paint(Tone::Endpoint.marker(), Tone::Endpoint, Stream::Stdout),
    endpoint.if_supports_color(Stream::Stdout, |s| s.bold())
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let mut stdout = std::io::stdout().lock();
  serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON report")?;
  writeln!(stdout).context("Failed to write JSON report")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn elapsed_uses_coarsest_sensible_unit() {
    assert_eq!(format_elapsed(Duration::from_millis(850)), "850ms");
    assert_eq!(format_elapsed(Duration::from_millis(12_340)), "12.3s");
    assert_eq!(format_elapsed(Duration::from_secs(125)), "2m05s");
  }

  #[test]
  fn list_of_distros() {
    let names = vec!["alpine".to_string(), "podman".to_string()];
    assert_eq!(format_list(&names), "alpine, podman");
    assert_eq!(format_list(&Vec::<String>::new()), "(none)");
  }

  #[test]
  fn every_tone_has_its_own_marker() {
    let tones = [Tone::Done, Tone::Failed, Tone::Caution, Tone::Note, Tone::Endpoint];
    let markers: std::collections::BTreeSet<_> = tones.iter().map(|t| t.marker()).collect();
    assert_eq!(markers.len(), tones.len());
  }
}
