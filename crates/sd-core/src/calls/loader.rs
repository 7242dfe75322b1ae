//! Call table loading and validation.
//!
//! A table is a JSON document `{"version": 1, "calls": [...]}`. Loading is
//! all-or-nothing: the first problem found aborts with a diagnostic naming
//! the entry, the field and (where it can be found) the source line.

use std::collections::{BTreeSet, HashMap};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::database::{BodyTemplate, CallDefinition, CallId, PartAction, PartTemplate};
use super::model::{ArgumentRange, CallFlags, Modifier, PartEntry, Repeat, Scheme, SchemeSetup};
use super::pattern::{normalize, Arguments, NamePattern};
use crate::concept::Concept;
use crate::designator::Designator;
use crate::error::TableDiagnostic;
use crate::level::Level;
use crate::setup::SetupKind;

/// Highest table format this loader understands.
pub const TABLE_VERSION: u32 = 1;

const ENTRY_FIELDS: [&str; 9] = [
    "name",
    "aliases",
    "level",
    "modifiers",
    "flags",
    "argument",
    "setups",
    "schemes",
    "parts",
];

pub(crate) struct LoadedTable {
    pub version: u32,
    pub calls: Vec<CallDefinition>,
    pub touch: Option<CallId>,
}

/// An entry after field parsing, before its references are resolved.
struct RawCall {
    name: String,
    pattern: NamePattern,
    aliases: Vec<NamePattern>,
    level: Level,
    modifiers: Vec<Modifier>,
    flags: CallFlags,
    argument: Option<ArgumentRange>,
    setups: Option<BTreeSet<SetupKind>>,
    body: RawBody,
    span: Span,
}

enum RawBody {
    Schemes(Vec<Scheme>),
    Parts(Vec<PartEntry>),
}

/// Byte range of one entry in the source.
#[derive(Clone, Copy)]
struct Span {
    start: Option<usize>,
    end: usize,
}

/// Maps entries and fields back to source lines.
struct Locator<'a> {
    source: &'a str,
    cursor: usize,
}

impl<'a> Locator<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, cursor: 0 }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.source[..offset].matches('\n').count() + 1
    }

    /// Finds the next `"name": <encoded>` pair after the previous one.
    fn next_entry(&mut self, name: &str) -> Option<usize> {
        let encoded = serde_json::to_string(name).ok()?;
        let mut from = self.cursor;
        while let Some(found) = self.source[from..].find("\"name\"") {
            let at = from + found;
            let rest = self.source[at + 6..].trim_start();
            if let Some(value) = rest.strip_prefix(':') {
                if value.trim_start().starts_with(&encoded) {
                    self.cursor = at + 6;
                    return Some(at);
                }
            }
            from = at + 6;
        }
        None
    }

    fn field_line(&self, span: Span, field: &str) -> Option<usize> {
        let start = span.start?;
        let key = format!("\"{}\"", field);
        self.source[start..span.end]
            .find(&key)
            .map(|i| self.line_of(start + i))
    }
}

/// Builds diagnostics for one entry.
struct EntryContext<'a, 'b> {
    locator: &'b Locator<'a>,
    entry: Option<String>,
    span: Span,
}

impl EntryContext<'_, '_> {
    fn error(&self, field: Option<&str>, message: impl Into<String>) -> TableDiagnostic {
        let mut diagnostic = TableDiagnostic::new(message);
        if let Some(ref entry) = self.entry {
            diagnostic = diagnostic.with_entry(entry.clone());
        }
        let line = match field {
            Some(f) => {
                // Only the top-level key is searched for; "parts[1].call"
                // is reported at the line of "parts".
                let key = f.split(['[', '.']).next().unwrap_or(f);
                self.locator.field_line(self.span, key)
            }
            None => None,
        }
        .or_else(|| self.span.start.map(|s| self.locator.line_of(s)));
        if let Some(field) = field {
            diagnostic = diagnostic.with_field(field);
        }
        match line {
            Some(line) => diagnostic.at_line(line),
            None => diagnostic,
        }
    }

    fn field<T: DeserializeOwned>(
        &self,
        object: &Map<String, Value>,
        key: &str,
    ) -> Result<Option<T>, TableDiagnostic> {
        match object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| self.error(Some(key), format!("invalid {}: {}", key, e))),
        }
    }
}

pub(crate) fn load(source: &str) -> Result<LoadedTable, TableDiagnostic> {
    let root: Value = serde_json::from_str(source).map_err(|e| {
        TableDiagnostic::new(format!("invalid JSON ({:?} error)", e.classify())).at_line(e.line())
    })?;
    let root = root
        .as_object()
        .ok_or_else(|| TableDiagnostic::new("the table must be a JSON object").at_line(1))?;

    let version = match root.get("version").and_then(Value::as_u64) {
        Some(v) if (1..=u64::from(TABLE_VERSION)).contains(&v) => v as u32,
        Some(v) => {
            return Err(TableDiagnostic::new(format!(
                "unsupported table version {} (expected {})",
                v, TABLE_VERSION
            ))
            .with_field("version"))
        }
        None => {
            return Err(
                TableDiagnostic::new("missing or non-numeric version").with_field("version")
            )
        }
    };
    let entries = root
        .get("calls")
        .and_then(Value::as_array)
        .ok_or_else(|| TableDiagnostic::new("missing \"calls\" array").with_field("calls"))?;

    let mut locator = Locator::new(source);
    let mut starts = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.get("name").and_then(Value::as_str);
        starts.push(name.and_then(|n| locator.next_entry(n)));
    }
    let raw = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let end = starts[i + 1..]
                .iter()
                .flatten()
                .next()
                .copied()
                .unwrap_or(source.len());
            let span = Span {
                start: starts[i],
                end,
            };
            parse_entry(&locator, i, entry, span)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let table = Resolver {
        locator: &locator,
        raw: &raw,
    };
    let bodies = raw
        .iter()
        .map(|call| table.resolve_body(call))
        .collect::<Result<Vec<_>, _>>()?;
    table.check_cycles(&bodies)?;

    let touch = raw
        .iter()
        .position(|call| {
            call.pattern
                .matches(&normalize("step to a wave"), None)
                .is_some()
        })
        .map(CallId);
    if touch.is_none() {
        if let Some(call) = raw.iter().find(|c| c.flags.step_to_wave) {
            return Err(table
                .context(call)
                .error(Some("flags"), "step_to_wave needs a \"step to a wave\" call in the table"));
        }
    }

    let mut setups: HashMap<usize, BTreeSet<SetupKind>> = HashMap::new();
    for i in 0..raw.len() {
        setup_closure(i, &raw, &bodies, touch, &mut setups);
    }

    let calls = raw
        .into_iter()
        .zip(bodies)
        .enumerate()
        .map(|(i, (call, body))| CallDefinition {
            line: call.span.start.map(|s| locator.line_of(s)),
            setups: setups.remove(&i).unwrap_or_default(),
            name: call.name,
            pattern: call.pattern,
            aliases: call.aliases,
            level: call.level,
            modifiers: call.modifiers,
            flags: call.flags,
            argument: call.argument,
            body,
        })
        .collect();

    Ok(LoadedTable {
        version,
        calls,
        touch,
    })
}

fn parse_entry(
    locator: &Locator<'_>,
    index: usize,
    entry: &Value,
    span: Span,
) -> Result<RawCall, TableDiagnostic> {
    let mut cx = EntryContext {
        locator,
        entry: None,
        span,
    };
    let object = entry
        .as_object()
        .ok_or_else(|| cx.error(None, format!("entry {} is not an object", index)))?;

    let name = match object.get("name") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) => return Err(cx.error(Some("name"), "empty call name")),
        Some(_) => return Err(cx.error(Some("name"), "name must be a string")),
        None => return Err(cx.error(None, format!("entry {} has no name", index))),
    };
    cx.entry = Some(name.clone());

    if let Some(unknown) = object.keys().find(|k| !ENTRY_FIELDS.contains(&k.as_str())) {
        return Err(cx.error(Some(unknown), format!("unknown field \"{}\"", unknown)));
    }

    let pattern = NamePattern::parse(&name);
    let aliases: Vec<String> = cx.field(object, "aliases")?.unwrap_or_default();
    let level: Level = cx
        .field(object, "level")?
        .ok_or_else(|| cx.error(Some("level"), "missing level"))?;
    let modifiers: Vec<Modifier> = cx.field(object, "modifiers")?.unwrap_or_default();
    let flags: CallFlags = cx.field(object, "flags")?.unwrap_or_default();
    let argument: Option<ArgumentRange> = cx.field(object, "argument")?;
    let setups: Option<Vec<SetupKind>> = cx.field(object, "setups")?;

    match (pattern.has_number(), argument) {
        (true, None) => {
            return Err(cx.error(Some("argument"), "a name with <N> needs an argument range"))
        }
        (false, Some(_)) => {
            return Err(cx.error(Some("argument"), "argument range given but the name has no <N>"))
        }
        (_, Some(range)) => {
            if range.min > range.max {
                return Err(cx.error(
                    Some("argument"),
                    format!("argument minimum {} is above maximum {}", range.min, range.max),
                ));
            }
            if let Some(default) = range.default.filter(|d| !range.contains(*d)) {
                return Err(cx.error(
                    Some("argument"),
                    format!("default {} is outside {}..={}", default, range.min, range.max),
                ));
            }
        }
        (false, None) => {}
    }

    let aliases = aliases
        .iter()
        .map(|a| {
            let alias = NamePattern::parse(a);
            if alias.items().is_empty() {
                Err(cx.error(Some("aliases"), "empty alias"))
            } else if alias.has_number() != pattern.has_number() {
                Err(cx.error(Some("aliases"), format!("alias \"{}\" must take the same arguments", a)))
            } else {
                Ok(alias)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let schemes: Option<Vec<Scheme>> = cx.field(object, "schemes")?;
    let parts: Option<Vec<PartEntry>> = cx.field(object, "parts")?;
    let body = match (schemes, parts) {
        (Some(schemes), None) => {
            check_schemes(&cx, "schemes", &schemes)?;
            RawBody::Schemes(schemes)
        }
        (None, Some(parts)) => {
            check_parts(&cx, "parts", &parts, argument.is_some())?;
            RawBody::Parts(parts)
        }
        (Some(_), Some(_)) => {
            return Err(cx.error(Some("parts"), "give either schemes or parts, not both"))
        }
        (None, None) => return Err(cx.error(None, "missing body: schemes or parts")),
    };

    Ok(RawCall {
        name,
        pattern,
        aliases,
        level,
        modifiers,
        flags,
        argument,
        setups: setups.map(|s| s.into_iter().collect()),
        body,
        span,
    })
}

fn check_schemes(cx: &EntryContext<'_, '_>, path: &str, schemes: &[Scheme]) -> Result<(), TableDiagnostic> {
    if schemes.is_empty() {
        return Err(cx.error(Some(path), "no schemes"));
    }
    for (i, scheme) in schemes.iter().enumerate() {
        let here = format!("{}[{}]", path, i);
        if scheme.moves.is_empty() {
            return Err(cx.error(Some(&here), "scheme has no moves"));
        }
        if let Some(rule) = scheme.moves.iter().find(|m| m.who.is_empty()) {
            return Err(cx.error(
                Some(&format!("{}.moves", here)),
                format!("move {:?} has nobody to do it", rule.movement),
            ));
        }
    }
    Ok(())
}

fn check_parts(
    cx: &EntryContext<'_, '_>,
    path: &str,
    parts: &[PartEntry],
    has_argument: bool,
) -> Result<(), TableDiagnostic> {
    if parts.is_empty() {
        return Err(cx.error(Some(path), "no parts"));
    }
    for (i, part) in parts.iter().enumerate() {
        let here = format!("{}[{}]", path, i);
        let actions = [part.call.is_some(), part.schemes.is_some(), part.parts.is_some()]
            .iter()
            .filter(|a| **a)
            .count();
        if actions != 1 {
            return Err(cx.error(
                Some(&here),
                "a part needs exactly one of call, schemes or parts",
            ));
        }
        if part.times != Repeat::Once && !has_argument {
            return Err(cx.error(
                Some(&format!("{}.times", here)),
                "repeat count refers to <N> but the call takes no argument",
            ));
        }
        if let Some(ref concept) = part.concept {
            if Concept::from_name(concept).is_none() {
                return Err(cx.error(
                    Some(&format!("{}.concept", here)),
                    format!("unknown concept \"{}\"", concept),
                ));
            }
        }
        if let Some(ref who) = part.who {
            if who.parse::<Designator>().is_err() {
                return Err(cx.error(
                    Some(&format!("{}.who", here)),
                    format!("unknown designator \"{}\"", who),
                ));
            }
        }
        if let Some(ref schemes) = part.schemes {
            check_schemes(cx, &format!("{}.schemes", here), schemes)?;
        }
        if let Some(ref inner) = part.parts {
            check_parts(cx, &format!("{}.parts", here), inner, has_argument)?;
        }
    }
    Ok(())
}

/// Second pass: turns call references into ids.
struct Resolver<'a, 'b> {
    locator: &'b Locator<'a>,
    raw: &'b [RawCall],
}

impl Resolver<'_, '_> {
    fn context(&self, call: &RawCall) -> EntryContext<'_, '_> {
        EntryContext {
            locator: self.locator,
            entry: Some(call.name.clone()),
            span: call.span,
        }
    }

    fn resolve_body(&self, call: &RawCall) -> Result<BodyTemplate, TableDiagnostic> {
        match &call.body {
            RawBody::Schemes(schemes) => Ok(BodyTemplate::Schemes(schemes.clone())),
            RawBody::Parts(parts) => Ok(BodyTemplate::Parts(self.resolve_parts(
                &self.context(call),
                "parts",
                parts,
            )?)),
        }
    }

    fn resolve_parts(
        &self,
        cx: &EntryContext<'_, '_>,
        path: &str,
        parts: &[PartEntry],
    ) -> Result<Vec<PartTemplate>, TableDiagnostic> {
        parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                let here = format!("{}[{}]", path, i);
                let action = if let Some(ref reference) = part.call {
                    let (id, args) = self.resolve_reference(cx, &format!("{}.call", here), reference)?;
                    PartAction::Call { id, args }
                } else if let Some(ref schemes) = part.schemes {
                    PartAction::Schemes(schemes.clone())
                } else {
                    let inner = part.parts.as_deref().unwrap_or_default();
                    PartAction::Parts(self.resolve_parts(cx, &format!("{}.parts", here), inner)?)
                };
                Ok(PartTemplate {
                    action,
                    times: part.times,
                    concept: part.concept.as_deref().and_then(Concept::from_name),
                    who: part.who.as_deref().and_then(|w| w.parse().ok()),
                })
            })
            .collect()
    }

    fn resolve_reference(
        &self,
        cx: &EntryContext<'_, '_>,
        field: &str,
        reference: &str,
    ) -> Result<(CallId, Arguments), TableDiagnostic> {
        let tokens = normalize(reference);
        let found: Vec<(usize, Arguments)> = self
            .raw
            .iter()
            .enumerate()
            .filter_map(|(i, call)| {
                let default = call.argument.and_then(|a| a.default);
                std::iter::once(&call.pattern)
                    .chain(call.aliases.iter())
                    .find_map(|p| p.matches(&tokens, default))
                    .map(|args| (i, args))
            })
            .collect();
        match found.as_slice() {
            [] => Err(cx.error(Some(field), format!("unknown call \"{}\"", reference))),
            [(i, args)] => {
                let target = &self.raw[*i];
                if let (Some(range), Some(n)) = (target.argument, args.number) {
                    if !range.contains(n) {
                        return Err(cx.error(
                            Some(field),
                            format!(
                                "argument {} to \"{}\" is outside {}..={}",
                                n, target.name, range.min, range.max
                            ),
                        ));
                    }
                }
                Ok((CallId(*i), *args))
            }
            _ => Err(cx.error(
                Some(field),
                format!(
                    "call reference \"{}\" is ambiguous: {}",
                    reference,
                    found
                        .iter()
                        .map(|(i, _)| self.raw[*i].name.as_str())
                        .collect::<Vec<_>>()
                        .join(" / ")
                ),
            )),
        }
    }

    /// Depth-first search over part references; any back edge is a cycle.
    fn check_cycles(&self, bodies: &[BodyTemplate]) -> Result<(), TableDiagnostic> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(
            i: usize,
            bodies: &[BodyTemplate],
            marks: &mut [Mark],
            path: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            marks[i] = Mark::Active;
            path.push(i);
            for next in references(&bodies[i]) {
                match marks[next.0] {
                    Mark::Active => {
                        let from = path.iter().position(|p| *p == next.0).unwrap_or(0);
                        let mut cycle = path[from..].to_vec();
                        cycle.push(next.0);
                        return Some(cycle);
                    }
                    Mark::New => {
                        if let Some(cycle) = visit(next.0, bodies, marks, path) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }
            path.pop();
            marks[i] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::New; bodies.len()];
        for start in 0..bodies.len() {
            if marks[start] != Mark::New {
                continue;
            }
            if let Some(cycle) = visit(start, bodies, &mut marks, &mut Vec::new()) {
                let names: Vec<String> = cycle
                    .iter()
                    .map(|i| format!("\"{}\"", self.raw[*i].name))
                    .collect();
                let first = &self.raw[cycle[0]];
                return Err(self.context(first).error(
                    Some("parts"),
                    format!("call refers to itself: {}", names.join(" -> ")),
                ));
            }
        }
        Ok(())
    }
}

fn references(body: &BodyTemplate) -> Vec<CallId> {
    fn walk(parts: &[PartTemplate], out: &mut Vec<CallId>) {
        for part in parts {
            match &part.action {
                PartAction::Call { id, .. } => out.push(*id),
                PartAction::Parts(inner) => walk(inner, out),
                PartAction::Schemes(_) => {}
            }
        }
    }
    let mut out = Vec::new();
    if let BodyTemplate::Parts(parts) = body {
        walk(parts, &mut out);
    }
    out
}

fn scheme_setups(schemes: &[Scheme]) -> BTreeSet<SetupKind> {
    schemes
        .iter()
        .flat_map(|s| match s.setup {
            SchemeSetup::Any => SetupKind::ALL.iter().copied().collect(),
            SchemeSetup::Kind(kind) => kind.reachable_from(),
        })
        .collect()
}

/// Setups a call can start from. Explicit `setups` win; otherwise a compound
/// call starts wherever its first part can.
fn setup_closure(
    i: usize,
    raw: &[RawCall],
    bodies: &[BodyTemplate],
    touch: Option<CallId>,
    memo: &mut HashMap<usize, BTreeSet<SetupKind>>,
) -> BTreeSet<SetupKind> {
    if let Some(known) = memo.get(&i) {
        return known.clone();
    }
    let mut out = match (&raw[i].setups, &bodies[i]) {
        (Some(explicit), _) => explicit.clone(),
        (None, BodyTemplate::Schemes(schemes)) => scheme_setups(schemes),
        (None, BodyTemplate::Parts(parts)) => {
            first_part_setups(parts, raw, bodies, touch, memo)
        }
    };
    if raw[i].flags.step_to_wave {
        if let Some(t) = touch.filter(|t| t.0 != i) {
            out.extend(setup_closure(t.0, raw, bodies, touch, memo));
        }
    }
    memo.insert(i, out.clone());
    out
}

fn first_part_setups(
    parts: &[PartTemplate],
    raw: &[RawCall],
    bodies: &[BodyTemplate],
    touch: Option<CallId>,
    memo: &mut HashMap<usize, BTreeSet<SetupKind>>,
) -> BTreeSet<SetupKind> {
    let Some(first) = parts.first() else {
        return BTreeSet::new();
    };
    let mut out = match &first.action {
        PartAction::Call { id, .. } => setup_closure(id.0, raw, bodies, touch, memo),
        PartAction::Schemes(schemes) => scheme_setups(schemes),
        PartAction::Parts(inner) => first_part_setups(inner, raw, bodies, touch, memo),
    };
    if first.concept.is_some() || first.who.is_some() {
        // Paired and selective parts run on a smaller virtual or sub-setup.
        out.extend([SetupKind::TwoByFour, SetupKind::OneByEight, SetupKind::SquaredSet]);
        if first.concept.is_some() {
            out.extend([SetupKind::OneByFour, SetupKind::TwoByTwo]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(calls: &str) -> String {
        format!("{{\n  \"version\": 1,\n  \"calls\": [\n{}\n  ]\n}}\n", calls)
    }

    const PASS_THRU: &str = r#"    {
      "name": "pass thru",
      "level": "basic",
      "schemes": [
        {
          "setup": "1x2",
          "restriction": "facing_pair",
          "moves": [{ "who": ["any"], "move": { "step": { "forward": 2 } } }]
        }
      ]
    }"#;

    fn load_err(source: &str) -> TableDiagnostic {
        match load(source) {
            Ok(_) => panic!("table should not load"),
            Err(d) => d,
        }
    }

    #[test]
    fn test_minimal_table() {
        let loaded = load(&table(PASS_THRU)).unwrap();
        assert_eq!(loaded.calls.len(), 1);
        assert_eq!(loaded.calls[0].line, Some(5));
        assert!(loaded.touch.is_none());
    }

    #[test]
    fn test_invalid_json_reports_line() {
        let d = load_err("{\n  \"version\": 1,\n  \"calls\": [ oops ]\n}");
        assert_eq!(d.line, Some(3));
    }

    #[test]
    fn test_unknown_setup_names_entry_field_and_line() {
        let bad = PASS_THRU.replace("\"1x2\"", "\"3x3\"");
        let d = load_err(&table(&bad));
        assert_eq!(d.entry.as_deref(), Some("pass thru"));
        assert_eq!(d.field.as_deref(), Some("schemes"));
        assert_eq!(d.line, Some(7));
    }

    #[test]
    fn test_unknown_field() {
        let bad = PASS_THRU.replace("\"level\"", "\"lvl\"");
        let d = load_err(&table(&bad));
        assert_eq!(d.field.as_deref(), Some("lvl"));
        assert_eq!(d.line, Some(6));
    }

    #[test]
    fn test_unknown_part_reference() {
        let calls = format!(
            "{},\n    {{ \"name\": \"spin it\", \"level\": \"basic\", \"parts\": [{{ \"call\": \"spin\" }}] }}",
            PASS_THRU
        );
        let d = load_err(&table(&calls));
        assert_eq!(d.entry.as_deref(), Some("spin it"));
        assert_eq!(d.field.as_deref(), Some("parts[0].call"));
        assert!(d.message.contains("unknown call"));
    }

    #[test]
    fn test_reference_cycle() {
        let calls = r#"    { "name": "ping", "level": "basic", "parts": [{ "call": "pong" }] },
    { "name": "pong", "level": "basic", "parts": [{ "call": "ping" }] }"#;
        let d = load_err(&table(calls));
        assert!(d.message.contains("\"ping\" -> \"pong\" -> \"ping\""));
    }

    #[test]
    fn test_argument_rules() {
        let calls = r#"    { "name": "spin <N>", "level": "basic", "schemes": [
      { "setup": "any", "moves": [{ "who": ["any"], "move": "stand" }] } ] }"#;
        let d = load_err(&table(calls));
        assert_eq!(d.field.as_deref(), Some("argument"));

        let calls = r#"    { "name": "spin <N>", "level": "basic",
      "argument": { "min": 1, "max": 3, "default": 4 },
      "schemes": [{ "setup": "any", "moves": [{ "who": ["any"], "move": "stand" }] }] }"#;
        let d = load_err(&table(calls));
        assert!(d.message.contains("default 4"));
    }

    #[test]
    fn test_repeat_without_argument() {
        let calls = format!(
            "{},\n    {{ \"name\": \"again\", \"level\": \"basic\", \"parts\": [{{ \"call\": \"pass thru\", \"times\": \"n\" }}] }}",
            PASS_THRU
        );
        let d = load_err(&table(&calls));
        assert_eq!(d.field.as_deref(), Some("parts[0].times"));
    }

    #[test]
    fn test_step_to_wave_needs_touch() {
        let calls = r#"    { "name": "spin", "level": "basic", "flags": { "step_to_wave": true },
      "schemes": [{ "setup": "any", "moves": [{ "who": ["any"], "move": "stand" }] }] }"#;
        let d = load_err(&table(calls));
        assert_eq!(d.field.as_deref(), Some("flags"));
    }

    #[test]
    fn test_duplicate_names_load() {
        let calls = format!("{},\n{}", PASS_THRU, PASS_THRU);
        let loaded = load(&table(&calls)).unwrap();
        assert_eq!(loaded.calls.len(), 2);
        assert_ne!(loaded.calls[0].line, loaded.calls[1].line);
    }
}
