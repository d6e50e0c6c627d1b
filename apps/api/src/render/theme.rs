use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::render::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    Modern,
    Professional,
    Creative,
    Minimal,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Modern,
        Template::Professional,
        Template::Creative,
        Template::Minimal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Template::Modern => "modern",
            Template::Professional => "professional",
            Template::Creative => "creative",
            Template::Minimal => "minimal",
        }
    }

    pub fn default_colors(self) -> ColorScheme {
        let (primary, secondary, accent, background, text) = match self {
            Template::Modern => ("#3B82F6", "#6B7280", "#10B981", "#FFFFFF", "#1F2937"),
            Template::Professional => ("#1E3A8A", "#475569", "#B45309", "#FFFFFF", "#111827"),
            Template::Creative => ("#8B5CF6", "#6B7280", "#F59E0B", "#FFFFFF", "#1F2937"),
            Template::Minimal => ("#111827", "#9CA3AF", "#111827", "#FFFFFF", "#111827"),
        };
        ColorScheme {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            accent: accent.to_string(),
            background: background.to_string(),
            text: text.to_string(),
        }
    }

    /// Layout rules layered on top of the shared base stylesheet.
    fn layout_css(self) -> &'static str {
        match self {
            Template::Modern => {
                ".header { background: var(--primary-color); color: var(--background-color); border-radius: 12px; }\n\
                 .section-title { border-left: 4px solid var(--accent-color); padding-left: 12px; }\n"
            }
            Template::Professional => {
                ".header { border-bottom: 3px solid var(--primary-color); }\n\
                 .section-title { text-transform: uppercase; letter-spacing: 0.08em; color: var(--primary-color); }\n\
                 body { font-family: Georgia, 'Times New Roman', serif; }\n"
            }
            Template::Creative => {
                ".header { background: linear-gradient(135deg, var(--primary-color), var(--accent-color)); color: var(--background-color); border-radius: 24px; }\n\
                 .skill-tag { border-radius: 999px; }\n"
            }
            Template::Minimal => {
                ".header { padding: 0; }\n\
                 .section-title { font-weight: 400; border-bottom: 1px solid var(--secondary-color); }\n\
                 .skill-tag { background: transparent; border: 1px solid var(--secondary-color); }\n"
            }
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RenderError::UnknownTemplate(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

impl ColorScheme {
    /// Colors end up verbatim in the stylesheet, so only hex literals are accepted.
    pub fn validate(&self) -> Result<(), RenderError> {
        for (name, value) in [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("accent", &self.accent),
            ("background", &self.background),
            ("text", &self.text),
        ] {
            if !HEX_COLOR.is_match(value) {
                return Err(RenderError::InvalidColor {
                    field: name,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn stylesheet(template: Template, colors: &ColorScheme) -> String {
    format!(
        r#":root {{
    --primary-color: {primary};
    --secondary-color: {secondary};
    --accent-color: {accent};
    --background-color: {background};
    --text-color: {text};
    --border-color: #e5e7eb;
}}

* {{ box-sizing: border-box; margin: 0; padding: 0; }}

body {{
    font-family: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
    line-height: 1.6;
    color: var(--text-color);
    background: var(--background-color);
}}

.container {{ max-width: 960px; margin: 0 auto; padding: 32px 20px; }}
.header {{ padding: 32px; margin-bottom: 32px; }}
.name {{ font-size: 2.5rem; font-weight: 700; }}
.contact-info {{ display: flex; flex-wrap: wrap; gap: 16px; margin-top: 12px; }}
.contact-item a {{ color: inherit; }}
.section {{ margin-bottom: 32px; }}
.section-title {{ font-size: 1.5rem; margin-bottom: 16px; }}
.experience-item, .education-item {{ margin-bottom: 20px; }}
.company, .institution {{ color: var(--primary-color); font-weight: 600; margin-right: 12px; }}
.duration {{ color: var(--secondary-color); }}
.experience-description {{ margin: 8px 0 0 20px; }}
.technologies {{ margin-top: 8px; color: var(--secondary-color); }}
.skills-category {{ margin-bottom: 12px; }}
.skills-list {{ display: flex; flex-wrap: wrap; gap: 8px; margin-top: 6px; }}
.skill-tag {{ padding: 4px 10px; border-radius: 6px; background: var(--border-color); }}
.footer {{ text-align: center; color: var(--secondary-color); margin-top: 48px; }}

{layout}"#,
        primary = colors.primary,
        secondary = colors.secondary,
        accent = colors.accent,
        background = colors.background,
        text = colors.text,
        layout = template.layout_css(),
    )
}
