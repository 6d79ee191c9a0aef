//! Driver script parser
//!
//! Turns a `load` / `setConfigVar` / `export*` / `exit` script into an
//! [`ExportJob`]. Settings made after an export are attached to the later
//! requests as overrides, so every export sees exactly the configuration in
//! effect at its position in the script.
//!
//! Statements are parsed one at a time; nothing after `exit()` is looked at.

use crate::error::DriverError;
use crate::model::{qualify_key, ConfigVars, ExportFormat, ExportJob, ExportRequest};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_until};
use nom::character::complete::{
    alpha1, alphanumeric1, anychar, char, line_ending, multispace1, none_of, space1,
};
use nom::combinator::{eof, map, opt, recognize, value};
use nom::multi::{fold_many0, many0_count, separated_list0};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;
use std::path::{Path, PathBuf};

/// Argument of a call expression
#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Ident(String),
    Str(String),
}

/// One parsed statement
#[derive(Debug)]
struct Call {
    binding: Option<String>,
    name: String,
    args: Vec<Arg>,
    line: usize,
}

struct Loaded {
    work: PathBuf,
    binding: Option<String>,
    line: usize,
}

/// Where a statement stopped parsing, and why
struct Syntax<'a> {
    at: &'a str,
    reason: String,
}

fn is_newline(c: char) -> bool {
    c == '\n' || c == '\r'
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), take_till(is_newline)))(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Whitespace and comments
fn trivia(input: &str) -> IResult<&str, ()> {
    value((), many0_count(alt((multispace1, line_comment, block_comment))))(input)
}

/// Trivia that does not end the current line
fn inline_trivia(input: &str) -> IResult<&str, ()> {
    value((), many0_count(alt((space1, block_comment))))(input)
}

/// Trivia between statements; stray semicolons are empty statements
fn separators(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0_count(alt((multispace1, line_comment, block_comment, tag(";")))),
    )(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"), tag("$"))),
        many0_count(alt((alphanumeric1, tag("_"), tag("$")))),
    ))(input)
}

fn escape(input: &str) -> IResult<&str, char> {
    preceded(
        char('\\'),
        map(anychar, |c| match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            other => other,
        }),
    )(input)
}

fn push(mut s: String, c: char) -> String {
    s.push(c);
    s
}

fn single_quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('\''),
        fold_many0(alt((escape, none_of("'\\\n"))), String::new, push),
        char('\''),
    )(input)
}

fn double_quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(alt((escape, none_of("\"\\\n"))), String::new, push),
        char('"'),
    )(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    alt((single_quoted, double_quoted))(input)
}

fn argument(input: &str) -> IResult<&str, Arg> {
    alt((
        map(string_literal, Arg::Str),
        map(ident, |s: &str| Arg::Ident(s.to_string())),
    ))(input)
}

/// `[var|let|const] name =`
fn binding(input: &str) -> IResult<&str, &str> {
    let declaration = pair(alt((tag("var"), tag("let"), tag("const"))), multispace1);
    terminated(
        preceded(opt(declaration), ident),
        tuple((trivia, char('='), trivia)),
    )(input)
}

/// A statement ends at `;`, at a line break, or at end of input
fn terminator(input: &str) -> IResult<&str, ()> {
    preceded(
        inline_trivia,
        alt((
            value((), char(';')),
            value((), line_ending),
            value((), line_comment),
            value((), eof),
        )),
    )(input)
}

/// Input the failing parser was looking at
fn stuck<'a>(err: nom::Err<nom::error::Error<&'a str>>) -> &'a str {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
        nom::Err::Incomplete(_) => "",
    }
}

fn found(at: &str) -> String {
    let word: String = at
        .chars()
        .take_while(|c| !c.is_whitespace())
        .take(20)
        .collect();
    if !word.is_empty() {
        format!("`{}`", word)
    } else if at.is_empty() {
        "end of script".to_string()
    } else {
        "a line break".to_string()
    }
}

fn expected<'a>(at: &'a str, what: &str) -> Syntax<'a> {
    let reason = if at.starts_with("/*") {
        "unterminated block comment".to_string()
    } else {
        format!("expected {}, found {}", what, found(at))
    };
    Syntax { at, reason }
}

/// Parse one statement starting at `input`
fn statement(input: &str, line: usize) -> Result<(&str, Call), Syntax<'_>> {
    let (rest, (bound, name)) =
        pair(opt(binding), ident)(input).map_err(|e| expected(stuck(e), "a statement"))?;

    let (rest, _) = preceded(trivia, char('('))(rest)
        .map_err(|e| expected(stuck(e), &format!("`(` after `{}`", name)))?;

    let (rest, args) = terminated(
        preceded(
            trivia,
            separated_list0(tuple((trivia, char(','), trivia)), argument),
        ),
        pair(trivia, char(')')),
    )(rest)
    .map_err(|e| {
        let at = stuck(e);
        if at.starts_with(|c: char| c == '\'' || c == '"') && string_literal(at).is_err() {
            Syntax {
                at,
                reason: "unterminated string literal".to_string(),
            }
        } else {
            expected(at, &format!("`,` or `)` in arguments to `{}`", name))
        }
    })?;

    let (rest, _) =
        terminator(rest).map_err(|e| expected(stuck(e), "`;` or a line break"))?;

    Ok((
        rest,
        Call {
            binding: bound.map(str::to_string),
            name: name.to_string(),
            args,
            line,
        },
    ))
}

fn string_args<const N: usize>(call: &Call, origin: &Path) -> Result<[String; N], DriverError> {
    let strings: Vec<String> = call
        .args
        .iter()
        .filter_map(|a| match a {
            Arg::Str(s) => Some(s.clone()),
            Arg::Ident(_) => None,
        })
        .collect();
    if call.args.len() != N || strings.len() != N {
        return Err(DriverError::parse_at(
            origin,
            call.line,
            format!("`{}` takes {} string argument(s)", call.name, N),
        ));
    }
    strings.try_into().map_err(|_| {
        DriverError::parse_at(origin, call.line, format!("bad arguments to `{}`", call.name))
    })
}

/// Parse a driver script
///
/// `origin` is only used to label errors.
pub fn parse_script(source: &str, origin: &Path) -> Result<ExportJob, DriverError> {
    let line_at = |rest: &str| source[..source.len() - rest.len()].matches('\n').count() + 1;

    let mut loaded: Option<Loaded> = None;
    let mut settings = ConfigVars::new();
    let mut late = ConfigVars::new();
    let mut requests: Vec<ExportRequest> = Vec::new();
    let mut rest = source;

    loop {
        if let Ok((after, _)) = separators(rest) {
            rest = after;
        }
        if rest.is_empty() {
            break;
        }

        let (after, call) = statement(rest, line_at(rest))
            .map_err(|s| DriverError::parse_at(origin, line_at(s.at), s.reason))?;
        rest = after;

        if call.binding.is_some() && call.name != "load" {
            return Err(DriverError::parse_at(
                origin,
                call.line,
                format!("only the result of `load` can be assigned, not `{}`", call.name),
            ));
        }

        match call.name.as_str() {
            "load" => {
                if let Some(prev) = &loaded {
                    return Err(DriverError::parse_at(
                        origin,
                        call.line,
                        format!("work file already loaded on line {}", prev.line),
                    ));
                }
                let [path] = string_args::<1>(&call, origin)?;
                log::debug!("Script loads {:?} (line {})", path, call.line);
                loaded = Some(Loaded {
                    work: PathBuf::from(path),
                    binding: call.binding,
                    line: call.line,
                });
            }
            "setConfigVar" => {
                let [key, value] = string_args::<2>(&call, origin)?;
                let key = qualify_key(&key);
                if requests.is_empty() {
                    settings.set(key, value);
                } else {
                    late.set(key, value);
                }
            }
            "exit" => {
                if !call.args.is_empty() {
                    return Err(DriverError::parse_at(
                        origin,
                        call.line,
                        "`exit` takes no arguments",
                    ));
                }
                // Anything left is never run; report it but do not parse it
                if let Ok((after, _)) = separators(rest) {
                    rest = after;
                }
                if !rest.is_empty() {
                    log::warn!(
                        "{}: ignoring statements after exit() from line {}",
                        origin.display(),
                        line_at(rest)
                    );
                }
                break;
            }
            name => {
                let format = ExportFormat::from_command(name).ok_or_else(|| {
                    DriverError::parse_at(origin, call.line, format!("unsupported command `{}`", name))
                })?;
                let Some(load) = &loaded else {
                    return Err(DriverError::parse_at(
                        origin,
                        call.line,
                        format!("`{}` called before `load`", name),
                    ));
                };
                let output = match call.args.as_slice() {
                    [Arg::Ident(target), Arg::Str(output)] => {
                        if load.binding.as_deref() != Some(target.as_str()) {
                            return Err(DriverError::parse_at(
                                origin,
                                call.line,
                                format!("`{}` does not name the loaded work", target),
                            ));
                        }
                        output.clone()
                    }
                    _ => {
                        return Err(DriverError::parse_at(
                            origin,
                            call.line,
                            format!("`{}` takes the loaded work and an output path", name),
                        ))
                    }
                };
                requests.push(ExportRequest::new(format, output).with_overrides(late.clone()));
            }
        }
    }

    let loaded = loaded.ok_or_else(|| DriverError::parse(origin, "script never calls load()"))?;
    if requests.is_empty() {
        log::warn!("{}: script performs no exports", origin.display());
    }

    Ok(ExportJob {
        work: loaded.work,
        settings,
        requests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GATE_LIBRARY_KEY, SUBSTITUTION_LIBRARY_KEY};

    const SAMPLE: &str = "\
we = load('vme-tm.circuit.work');

setConfigVar(\"CircuitSettings.gateLibrary\", \"libraries/workcraft.lib\");
setConfigVar(\"CircuitSettings.substitutionLibrary\", \"\");
exportCircuitVerilog(we, 'vme-tm.circuit.v');

exportSvg(we, 'vme-tm.circuit.svg');
exportPng(we, 'vme-tm.circuit.png');
exportPdf(we, 'vme-tm.circuit.pdf');
exportEps(we, 'vme-tm.circuit.eps');
exportPs(we, 'vme-tm.circuit.ps');

exit();
";

    fn parse(source: &str) -> Result<ExportJob, DriverError> {
        parse_script(source, Path::new("job.js"))
    }

    fn error_line(err: DriverError) -> Option<usize> {
        match err {
            DriverError::Parse { line, .. } => line,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_script() {
        let job = parse(SAMPLE).unwrap();
        assert_eq!(job.work, PathBuf::from("vme-tm.circuit.work"));
        assert_eq!(job.settings.gate_library(), Some("libraries/workcraft.lib"));
        assert_eq!(job.settings.get(SUBSTITUTION_LIBRARY_KEY), Some(""));

        let formats: Vec<_> = job.requests.iter().map(|r| r.format).collect();
        assert_eq!(formats, ExportFormat::ALL.to_vec());
        assert_eq!(job.requests[5].output, PathBuf::from("vme-tm.circuit.ps"));
        assert!(job.requests.iter().all(|r| r.overrides.is_empty()));
    }

    #[test]
    fn test_string_escapes() {
        let job = parse(r#"w = load('it\'s "here".work'); setConfigVar("A.b", "tab\there\\x");"#)
            .unwrap();
        assert_eq!(job.work, PathBuf::from("it's \"here\".work"));
        assert_eq!(job.settings.get("A.b"), Some("tab\there\\x"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let job = parse(
            "// header\n/* block\n comment */\nw = load('a.work'); // trailing\n\
             exportSvg(w, /* inline */ 'a.svg')\n",
        )
        .unwrap();
        assert_eq!(job.requests[0].output, PathBuf::from("a.svg"));
    }

    #[test]
    fn test_short_setting_keys_are_qualified() {
        let job = parse(
            "w = load('a.work');\n\
             setConfigVar('gateLibrary', 'lib/std.lib');\n\
             exportSvg(w, 'a.svg');\n\
             setConfigVar('substitutionLibrary', 'sub.lib');\n\
             exportPdf(w, 'a.pdf');\n",
        )
        .unwrap();
        assert_eq!(job.settings.get(GATE_LIBRARY_KEY), Some("lib/std.lib"));
        assert!(!job.settings.contains("gateLibrary"));
        assert_eq!(
            job.requests[1].overrides.get(SUBSTITUTION_LIBRARY_KEY),
            Some("sub.lib")
        );
    }

    #[test]
    fn test_settings_after_export_apply_only_later() {
        let job = parse(
            "w = load('a.work');\n\
             setConfigVar('CircuitSettings.gateLibrary', 'one.lib');\n\
             exportCircuitVerilog(w, 'one.v');\n\
             setConfigVar('CircuitSettings.gateLibrary', 'two.lib');\n\
             exportCircuitVerilog(w, 'two.v');\n",
        )
        .unwrap();

        assert_eq!(
            job.settings_for(&job.requests[0]).get(GATE_LIBRARY_KEY),
            Some("one.lib")
        );
        assert_eq!(
            job.settings_for(&job.requests[1]).get(GATE_LIBRARY_KEY),
            Some("two.lib")
        );
    }

    #[test]
    fn test_statements_after_exit_are_not_parsed() {
        let job = parse("w = load('a.work');\nexportSvg(w, 'a.svg');\nexit();\nthis is @ not valid").unwrap();
        assert_eq!(job.requests.len(), 1);
    }

    #[test]
    fn test_declarations_and_missing_semicolons() {
        let job = parse("var w = load(\"a.work\")\nexportPdf(w, \"a.pdf\")\nexit()").unwrap();
        assert_eq!(job.requests[0].format, ExportFormat::Pdf);

        let job = parse("const variable = load('a.work');;\nexportPs(variable, 'a.ps');").unwrap();
        assert_eq!(job.requests[0].format, ExportFormat::Ps);
    }

    #[test]
    fn test_unknown_command_reports_line() {
        let err = parse("w = load('a.work');\n\nexportGif(w, 'a.gif');").unwrap_err();
        assert_eq!(error_line(err), Some(3));
    }

    #[test]
    fn test_export_before_load() {
        let err = parse("exportSvg(w, 'a.svg');\nw = load('a.work');").unwrap_err();
        assert_eq!(error_line(err), Some(1));
    }

    #[test]
    fn test_export_of_unknown_binding() {
        let err = parse("w = load('a.work');\nexportSvg(other, 'a.svg');").unwrap_err();
        assert!(err.to_string().contains("`other`"));
    }

    #[test]
    fn test_second_load_is_rejected() {
        let err = parse("w = load('a.work');\nv = load('b.work');").unwrap_err();
        assert!(err.to_string().contains("already loaded on line 1"));
    }

    #[test]
    fn test_missing_load() {
        let err = parse("setConfigVar('A.b', 'c');\nexit();").unwrap_err();
        assert_eq!(error_line(err), None);
    }

    #[test]
    fn test_two_statements_on_one_line_need_separator() {
        let err = parse("w = load('a.work') exportSvg(w, 'a.svg')").unwrap_err();
        assert!(err.to_string().contains("expected `;`"));
    }

    #[test]
    fn test_set_config_var_arity() {
        let err = parse("w = load('a.work');\nsetConfigVar('A.b');").unwrap_err();
        assert_eq!(error_line(err), Some(2));
    }

    #[test]
    fn test_unterminated_string_reports_line() {
        let err = parse("\nw = load('a.work);").unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
        assert_eq!(error_line(err), Some(2));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = parse("w = load('a.work');\n/* never closed\nexit();").unwrap_err();
        assert!(err.to_string().contains("unterminated block comment"));
        assert_eq!(error_line(err), Some(2));
    }

    #[test]
    fn test_unexpected_character() {
        let err = parse("  @").unwrap_err();
        assert!(err.to_string().contains('@'));
        assert_eq!(error_line(err), Some(1));
    }

    #[test]
    fn test_malformed_argument_list() {
        let err = parse("w = load('a.work');\nexportSvg(w 'a.svg');").unwrap_err();
        assert!(err.to_string().contains("arguments to `exportSvg`"));
        assert_eq!(error_line(err), Some(2));
    }
}
