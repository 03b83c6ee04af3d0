use crate::config::CONFIG_FILE;
use crate::error::Error;

/// Terminal bold.
const BOLD: &str = "\x1b[1m";
/// Terminal reset.
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigNotFound { path } => format!(
            "\
# Error: Config Not Found

`{}` does not exist.

## Fix

Pass an existing file to `--config`, or drop the flag to use `{CONFIG_FILE}`.
",
            path.display()
        ),
        Error::InvalidConfig { key, reason } => format!(
            "\
# Error: Invalid Config

`{key}` {reason}.

## Fix

Correct `{key}` in `{CONFIG_FILE}`.
"
        ),
        Error::FileNotFound { path } => format!(
            "\
# Error: File Not Found

`{}` does not exist.
",
            path.display()
        ),
        Error::MissingApiKey { service } => render_missing_api_key(service),
        Error::TomlDe(inner) => format!(
            "\
# Error: Invalid TOML

{inner}

## Fix

Check `{CONFIG_FILE}` for typos and unknown keys.
"
        ),
        Error::SchemaValidation { .. } | Error::SchemaVersion { .. } | Error::InvalidJudgeReply { .. } => {
            render_judge_reply(e)
        },
        _ => render_generic(e),
    };
}

fn render_generic(e: &Error) -> String {
    return format!(
        "\
# Error

{e}
"
    );
}

fn render_judge_reply(e: &Error) -> String {
    return format!(
        "\
# Error: Unusable Judge Reply

{e}

## Fix

Re-run the review; replies vary between calls. A persistent failure usually
means the configured model cannot follow the JSON schema.
"
    );
}

fn render_missing_api_key(service: &str) -> String {
    return format!(
        "\
# Error: Missing API Key

No API key configured for `{service}`.

## Fix

Pass `--api-key`, or export it:

    export OPENAI_API_KEY=sk-...
"
    );
}
