//! Comment/Substitution Engine — round-robins through a configured list of
//! comment templates, expanding `$name$` placeholders from a fixed
//! vocabulary.

use log::warn;

/// Values the `$key$` substitution vocabulary can resolve, supplied fresh
/// by the caller on every expansion.
pub struct SubstContext {
    pub index: u32,
    pub mycall: String,
    pub temp1: f64,
    pub voltage: f64,
    pub sats: u8,
    pub version: String,
    pub time_hms: String,
    pub date_mdy: String,
}

fn resolve(key: &str, ctx: &SubstContext) -> Option<String> {
    match key {
        "index" => Some(ctx.index.to_string()),
        "mycall" => Some(ctx.mycall.clone()),
        "temp1" => Some(format!("{:.0}", ctx.temp1)),
        "voltage" => Some(format!("{:.1}", ctx.voltage)),
        "sats" => Some(ctx.sats.to_string()),
        "ver" => Some(ctx.version.clone()),
        "time" => Some(ctx.time_hms.clone()),
        "date" => Some(ctx.date_mdy.clone()),
        _ => {
            warn!("unknown substitution `{key}`");
            Some(String::new())
        }
    }
}

/// Expand every `$key$` placeholder in `template`. An unterminated
/// placeholder (an opening `$` with no matching close) aborts the
/// expansion and returns `None`; the caller substitutes `"Error"`.
pub fn expand(template: &str, ctx: &SubstContext) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        match rest.find('$') {
            None => {
                out.push_str(rest);
                return Some(out);
            }
            Some(open) => {
                out.push_str(&rest[..open]);
                let after = &rest[open + 1..];
                match after.find('$') {
                    None => {
                        warn!("bad substitution `{after}`");
                        return None;
                    }
                    Some(close) => {
                        let key = &after[..close];
                        if let Some(value) = resolve(key, ctx) {
                            out.push_str(&value);
                        }
                        rest = &after[close + 1..];
                    }
                }
            }
        }
    }
}

/// Ordered, cyclically-consumed list of comment templates.
#[derive(Debug, Clone, Default)]
pub struct CommentRoster {
    templates: Vec<String>,
    idx: u32,
}

impl CommentRoster {
    pub fn new(templates: Vec<String>) -> Self {
        Self { templates, idx: 0 }
    }

    /// Pick `templates[idx mod N]`, advance the cursor, and resolve
    /// substitutions. Returns `"Error"` if the template is malformed.
    pub fn next_comment(&mut self, ctx_builder: impl FnOnce(u32) -> SubstContext) -> String {
        if self.templates.is_empty() {
            return String::new();
        }
        let n = self.templates.len();
        let template = self.templates[self.idx as usize % n].clone();
        let idx = self.idx;
        self.idx = self.idx.wrapping_add(1);
        let ctx = ctx_builder(idx);
        expand(&template, &ctx).unwrap_or_else(|| "Error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(index: u32) -> SubstContext {
        SubstContext {
            index,
            mycall: "N0CAL-7".into(),
            temp1: 75.0,
            voltage: 13.8,
            sats: 5,
            version: "v0.1.0".into(),
            time_hms: "12:00:00".into(),
            date_mdy: "01/01/2026".into(),
        }
    }

    #[test]
    fn plain_template_passes_through() {
        assert_eq!(expand("hello world", &ctx(0)).unwrap(), "hello world");
    }

    #[test]
    fn substitutes_known_keys() {
        let out = expand("Station $mycall$ temp $temp1$F", &ctx(0)).unwrap();
        assert_eq!(out, "Station N0CAL-7 temp 75F");
    }

    #[test]
    fn unknown_key_expands_empty_with_warning() {
        let out = expand("x$bogus$y", &ctx(0)).unwrap();
        assert_eq!(out, "xy");
    }

    #[test]
    fn unterminated_placeholder_is_none() {
        assert!(expand("x$mycall", &ctx(0)).is_none());
    }

    #[test]
    fn roster_cycles_and_advances() {
        let mut roster = CommentRoster::new(vec!["a $mycall$".into(), "b".into()]);
        assert_eq!(roster.next_comment(ctx), "a N0CAL-7");
        assert_eq!(roster.next_comment(ctx), "b");
        assert_eq!(roster.next_comment(ctx), "a N0CAL-7");
    }
}
