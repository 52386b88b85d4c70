// mailscrub/src/commands/mod.rs
//! Command implementations, one file per subcommand.

pub mod clean_url;
pub mod sanitize;

use anyhow::Result;
use mailscrub_core::RuleSet;
use std::io::Write;
use std::path::Path;

use crate::ui::output_format;

/// Loads the optional user rule file given with `--rules`.
///
/// A file that parses but defines no providers is accepted with a warning
/// written to `warn_to`.
pub(crate) fn load_user_rules<W: Write>(path: Option<&Path>, warn_to: &mut W, use_color: bool) -> Result<Option<RuleSet>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let rules = RuleSet::load_from_file(path)?;
    if rules.is_empty() {
        output_format::print_warn_message(
            warn_to,
            &format!("Rule file '{}' defines no providers; only the bundled rules apply.", path.display()),
            use_color,
        )?;
    }
    Ok(Some(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_rule_file_warns() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"{}")?;
        let mut warnings = Vec::new();

        let rules = load_user_rules(Some(file.path()), &mut warnings, false)?;
        assert!(rules.is_some_and(|r| r.is_empty()));
        let text = String::from_utf8(warnings)?;
        assert!(text.starts_with("warning: Rule file"));
        assert!(text.contains("defines no providers"));
        Ok(())
    }

    #[test]
    fn missing_flag_loads_nothing() -> Result<()> {
        let mut warnings = Vec::new();
        assert!(load_user_rules(None, &mut warnings, false)?.is_none());
        assert!(warnings.is_empty());
        Ok(())
    }
}
