use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use deboche_core::{EmbedSpec, Reply};
use owo_colors::OwoColorize;
use termimad::MadSkin;

/// Standard output formatting for the CLI
pub struct Output {
    skin: MadSkin,
}

impl Output {
    pub fn new() -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(termimad::ansi(6)); // cyan
        skin.bold.set_fg(termimad::ansi(15)); // bright white
        skin.strikeout.set_fg(termimad::ansi(8)); // grey, for hidden options
        skin.inline_code.set_fg(termimad::ansi(11)); // bright yellow
        skin.inline_code
            .set_bg(termimad::crossterm::style::Color::Black);

        Self { skin }
    }

    /// Print a system/status message (indented)
    pub fn status(&self, message: &str) {
        println!("  {}", message.dimmed());
    }

    /// Print an info message (indented)
    pub fn info(&self, label: &str, value: &str) {
        println!("  {} {}", label.bright_blue(), value);
    }

    /// Print a success message (indented)
    pub fn success(&self, message: &str) {
        println!("  {} {}", "✓".bright_green(), message);
    }

    /// Print an error message (indented)
    pub fn error(&self, message: &str) {
        println!("  {} {}", "✗".bright_red(), message);
    }

    /// Print a warning message (indented)
    pub fn warning(&self, message: &str) {
        println!("  {} {}", "⚠".yellow(), message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
    }

    /// Print a key-value pair (indented)
    pub fn kv(&self, key: &str, value: &str) {
        println!("  {} {}", format!("{}:", key).dimmed(), value);
    }

    /// Print Discord-flavoured markdown
    pub fn markdown(&self, content: &str) {
        self.skin.print_text(content);
    }

    /// Print a small table
    pub fn table(&self, header: &[&str], rows: Vec<Vec<String>>) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header.to_vec());
        for row in rows {
            table.add_row(row);
        }
        println!("{}", table);
    }

    /// Print an embed the way a chat client would lay it out, minus the colours
    pub fn embed(&self, embed: &EmbedSpec) {
        if let Some(title) = &embed.title {
            self.section(title);
        }
        if let Some(description) = &embed.description {
            self.markdown(description);
        }
        if !embed.fields.is_empty() {
            let line = embed
                .fields
                .iter()
                .map(|f| format!("{} {}", f.name.dimmed(), f.value.bright_white()))
                .collect::<Vec<_>>()
                .join("   ");
            println!("  {}", line);
        }
        if let Some(footer) = &embed.footer {
            self.status(footer);
        }
    }

    /// Print a whole reply. Buttons have no terminal equivalent and are skipped.
    pub fn reply(&self, reply: &Reply) {
        if let Some(content) = &reply.content {
            self.markdown(content);
        }
        if let Some(embed) = &reply.embed {
            self.embed(embed);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
