//! Theme kinds and per-theme default resolution.

use serde::{Deserialize, Serialize};

use crate::descriptor::{ColorDefault, ColorDescriptor};

/// Classification of the editor's active color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThemeKind {
	/// Light theme.
	Light,
	/// Dark theme.
	#[default]
	Dark,
	/// High contrast theme with a dark background.
	HighContrast,
	/// High contrast theme with a light background.
	HighContrastLight,
}

impl ColorDefault {
	/// Picks the value shown for `theme`.
	///
	/// High contrast themes prefer their dedicated value and otherwise fall back to the
	/// matching light or dark value.
	pub fn resolve(&self, theme: ThemeKind) -> Option<&str> {
		let themed = match self {
			Self::Literal(value) => return Some(value.as_str()),
			Self::Themed(themed) => themed,
		};

		let preferred = match theme {
			ThemeKind::HighContrast => themed.hc.as_ref().or(themed.dark.as_ref()),
			ThemeKind::HighContrastLight => themed.hc_light.as_ref().or(themed.light.as_ref()),
			ThemeKind::Light => themed.light.as_ref(),
			ThemeKind::Dark => themed.dark.as_ref(),
		};
		preferred.map(String::as_str)
	}
}

impl ColorDescriptor {
	/// Resolves the documentation value of this color for `theme`, if it has a default.
	pub fn resolve(&self, theme: ThemeKind) -> Option<&str> {
		self.default.as_ref().and_then(|default| default.resolve(theme))
	}
}
