use std::collections::HashSet;

use crate::core::version::{Argument, ArgumentValue, Profile};

/// Flags that may appear once per launch command line.
pub const SINGLETON_FLAGS: &[&str] = &[
    "--launchTarget",
    "--fml.forgeVersion",
    "--fml.mcVersion",
    "--fml.forgeGroup",
    "--fml.mcpVersion",
    "--version",
    "--gameDir",
    "--assetsDir",
    "--assetIndex",
    "--uuid",
    "--accessToken",
    "--userType",
    "--versionType",
    "--clientId",
    "--xuid",
];

fn is_singleton(token: &str) -> bool {
    SINGLETON_FLAGS.contains(&token)
}

fn is_value_token(token: &str) -> bool {
    !token.starts_with("--")
}

/// Keep the first occurrence of every singleton flag (with its value) and
/// drop later ones. One "seen" set spans game and JVM arguments, including
/// the value lists of conditional entries.
pub fn dedupe_singleton_args(profile: &mut Profile) {
    let Some(arguments) = profile.arguments.as_mut() else {
        return;
    };
    let mut seen = HashSet::new();
    arguments.game = dedupe_entries(std::mem::take(&mut arguments.game), &mut seen);
    arguments.jvm = dedupe_entries(std::mem::take(&mut arguments.jvm), &mut seen);
}

fn dedupe_entries(entries: Vec<Argument>, seen: &mut HashSet<String>) -> Vec<Argument> {
    let mut out = Vec::with_capacity(entries.len());
    let mut iter = entries.into_iter().peekable();

    while let Some(entry) = iter.next() {
        match entry {
            Argument::Plain(token) if is_singleton(&token) => {
                let first = seen.insert(token.clone());
                let value = match iter.peek() {
                    Some(Argument::Plain(next)) if is_value_token(next) => iter.next(),
                    _ => None,
                };
                if first {
                    out.push(Argument::Plain(token));
                    out.extend(value);
                }
            }
            Argument::Conditional { rules, value } => {
                let value = match value {
                    ArgumentValue::Many(tokens) => ArgumentValue::Many(dedupe_tokens(tokens, seen)),
                    single => single,
                };
                out.push(Argument::Conditional { rules, value });
            }
            other => out.push(other),
        }
    }

    out
}

/// Same rule over a flat token list.
pub fn dedupe_tokens(tokens: Vec<String>, seen: &mut HashSet<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        if !is_singleton(&token) {
            out.push(token);
            continue;
        }
        let first = seen.insert(token.clone());
        let value = match iter.peek() {
            Some(next) if is_value_token(next) => iter.next(),
            _ => None,
        };
        if first {
            out.push(token);
            out.extend(value);
        }
    }

    out
}
