use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::item::PackListState;
use crate::template::TemplateCatalog;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, state))]
    pub fn print_list(&mut self, state: &PackListState) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if !state.started {
            writeln!(out, "No list yet. Pick one with `packlist start <template>`.")?;
            return Ok(());
        }

        let (done, total) = state.progress();
        writeln!(out, "{}  ({done}/{total})", self.paint(&state.list_title, "1"))?;
        if state.items.is_empty() {
            writeln!(out, "(empty)")?;
            return Ok(());
        }

        let headers = vec![
            "#".to_string(),
            "".to_string(),
            "Item".to_string(),
            "Category".to_string(),
        ];

        let rows = state
            .sorted_items()
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let mark = if item.done {
                    self.paint("[x]", "32")
                } else {
                    "[ ]".to_string()
                };
                let label = format!("{} {}", item.icon, item.label);
                let label = if item.done { self.paint(&label, "2") } else { label };
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    mark,
                    label,
                    item.category.clone().unwrap_or_default(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;

        if state.all_done() {
            writeln!(out, "{}", self.paint("All packed.", "32"))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, catalog))]
    pub fn print_templates(&mut self, catalog: &TemplateCatalog) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Name".to_string(),
            "Items".to_string(),
            "Description".to_string(),
        ];
        let mut rows: Vec<Vec<String>> = catalog
            .all()
            .iter()
            .map(|t| {
                vec![
                    self.paint(&t.id, "33"),
                    t.name.clone(),
                    t.items.len().to_string(),
                    t.description.clone(),
                ]
            })
            .collect();
        rows.push(vec![
            self.paint(crate::item::NO_TEMPLATE_ID, "33"),
            crate::item::DEFAULT_TITLE.to_string(),
            "0".to_string(),
            "empty list".to_string(),
        ]);

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn print_message(&mut self, message: &str) -> anyhow::Result<()> {
        writeln!(io::stdout().lock(), "{message}")?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{}{} ", header, " ".repeat(widths[idx] - header.width()))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
