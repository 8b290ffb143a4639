use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::io::BufRead;

use fnv::FnvHashMap;
use mime::Mime;
use petgraph::prelude::*;
use regex::bytes::Regex;

use super::decode::compile_regex;
use super::{ArithOp, MagicLine, MagicType, StringFlags, TestOp};
use crate::error::{Error, ParseError, Result, Warning};
use crate::parse::parse_rule;

/// Strength multiplier
const MULT: i64 = 10;

/// Evaluation order of top-level rules: strongest first, then source order.
type RootKey = (Reverse<u32>, u32);

/// A compiled rule file.
///
/// Rules live in a graph with an edge from each rule to its continuations.
/// The set is immutable once loaded.
#[derive(Debug, Clone)]
pub struct MagicSet {
    name: String,
    pub(crate) graph: DiGraph<MagicLine, ()>,
    pub(crate) roots: BTreeMap<RootKey, NodeIndex>,
    pub(crate) regexes: FnvHashMap<NodeIndex, Regex>,
}

/// Score a top-level rule; stronger rules are tried first.
pub fn strength(rule: &MagicLine) -> u32 {
    if rule.test.op == TestOp::Always || rule.test.negate {
        return 1;
    }

    let len = rule.test.value.as_bytes().len() as i64;
    let mut s: i64 = 20;
    s += match rule.kind {
        MagicType::Integer { width, .. } | MagicType::Date { width, .. } => width.bytes() as i64 * MULT,
        MagicType::Float { .. } => 4 * MULT,
        MagicType::Double { .. } => 8 * MULT,
        MagicType::String { .. } | MagicType::PString => len * MULT,
        MagicType::String16 { .. } => len * MULT / 2,
        MagicType::Search { .. } | MagicType::Regex { .. } if len > 0 => len * (MULT / len).max(1),
        MagicType::Search { .. } | MagicType::Regex { .. } | MagicType::Default => 0,
    };
    s += match rule.test.op {
        TestOp::Equal => MULT,
        TestOp::Less | TestOp::Greater | TestOp::LessEq | TestOp::GreaterEq => -2 * MULT,
        TestOp::AllSet | TestOp::AllClear => -MULT,
        TestOp::Always => 0,
    };
    if let Some((op, n)) = rule.strength_adjust {
        s = op.apply(s, i64::from(n)).unwrap_or(s);
    }

    if s <= 0 {
        1
    } else {
        u32::try_from(s).unwrap_or(u32::MAX)
    }
}

/// Links parsed lines into the rule graph as they arrive.
struct TreeBuilder<'w> {
    name: String,
    graph: DiGraph<MagicLine, ()>,
    roots: Vec<NodeIndex>,
    regexes: FnvHashMap<NodeIndex, Regex>,
    regex_cache: FnvHashMap<(Vec<u8>, bool), Regex>,
    /// Ancestors of the next line, with their depths
    rulestack: Vec<(u32, NodeIndex)>,
    /// Target of `!:` directives
    last: Option<NodeIndex>,
    /// Depth of the last discarded line while its children are skipped
    orphan_depth: Option<u32>,
    scratch: Vec<u8>,
    warn: &'w mut dyn FnMut(&Warning),
}

impl<'w> TreeBuilder<'w> {
    fn new(name: &str, warn: &'w mut dyn FnMut(&Warning)) -> TreeBuilder<'w> {
        TreeBuilder {
            name: name.to_string(),
            graph: DiGraph::new(),
            roots: Vec::new(),
            regexes: FnvHashMap::default(),
            regex_cache: FnvHashMap::default(),
            rulestack: Vec::new(),
            last: None,
            orphan_depth: None,
            scratch: Vec::with_capacity(256),
            warn,
        }
    }

    fn warn(&mut self, line: u32, error: ParseError) {
        let warning = Warning {
            name: self.name.clone(),
            line,
            error,
        };
        (self.warn)(&warning);
    }

    fn line(&mut self, line: u32, text: &str) {
        let text = text.trim_start();
        if text.is_empty() || text.starts_with('#') {
            return;
        }
        if let Some(directive) = text.strip_prefix("!:") {
            if let Err(e) = self.directive(directive) {
                self.warn(line, e);
            }
            return;
        }

        match parse_rule(line, text, &mut self.scratch) {
            Ok((rule, warning)) => {
                if let Some(e) = warning {
                    self.warn(line, e);
                }
                if let Err(e) = self.attach(rule) {
                    self.warn(line, e);
                }
            }
            Err(e) => {
                self.warn(line, e);
                let depth = text.len() - text.trim_start_matches('>').len();
                self.discard(depth as u32);
            }
        }
    }

    fn discard(&mut self, depth: u32) {
        self.orphan_depth = Some(depth);
        self.last = None;
    }

    fn directive(&mut self, text: &str) -> std::result::Result<(), ParseError> {
        let (keyword, arg) = match text.find(char::is_whitespace) {
            Some(i) => (&text[..i], text[i..].trim()),
            None => (text, ""),
        };
        match keyword {
            "mime" => {
                let node = self.last.ok_or(ParseError::DirectiveWithoutRule("!:mime"))?;
                let mime: Mime = arg
                    .parse()
                    .map_err(|_| ParseError::InvalidMime(arg.to_string()))?;
                self.graph[node].mime = Some(mime);
            }
            "strength" => {
                let node = self.last.ok_or(ParseError::DirectiveWithoutRule("!:strength"))?;
                let invalid = || ParseError::InvalidStrength(arg.to_string());
                let c = arg.chars().next().ok_or_else(invalid)?;
                let op = match ArithOp::from_char(c) {
                    Some(op @ ArithOp::Add) | Some(op @ ArithOp::Sub) | Some(op @ ArithOp::Mul)
                    | Some(op @ ArithOp::Div) => op,
                    _ => return Err(invalid()),
                };
                let n: u32 = arg[1..].trim().parse().map_err(|_| invalid())?;
                if n > 255 || (op == ArithOp::Div && n == 0) {
                    return Err(invalid());
                }
                self.graph[node].strength_adjust = Some((op, n));
            }
            // apple, ext and the like are not used here
            _ => {}
        }
        Ok(())
    }

    fn compile(&mut self, rule: &MagicLine) -> std::result::Result<Option<Regex>, ParseError> {
        let flags = match rule.kind {
            MagicType::Regex { flags } if rule.test.op != TestOp::Always => flags,
            _ => return Ok(None),
        };
        let key = (
            rule.test.value.as_bytes().to_vec(),
            flags.contains(StringFlags::IGNORE_LOWER),
        );
        if let Some(re) = self.regex_cache.get(&key) {
            return Ok(Some(re.clone()));
        }
        let re = compile_regex(&key.0, flags).map_err(|e| ParseError::InvalidRegex(e.to_string()))?;
        self.regex_cache.insert(key, re.clone());
        Ok(Some(re))
    }

    fn attach(&mut self, rule: MagicLine) -> std::result::Result<(), ParseError> {
        let depth = rule.depth;

        if let Some(orphan) = self.orphan_depth {
            if depth > orphan {
                self.last = None;
                return Err(ParseError::Orphan);
            }
            self.orphan_depth = None;
        }

        let current = self.rulestack.last().map(|&(d, _)| d);
        match current {
            None if depth > 0 => {
                self.discard(depth);
                return Err(ParseError::Orphan);
            }
            Some(current) if depth > current + 1 => {
                self.discard(depth);
                return Err(ParseError::LevelSkipped { from: current, to: depth });
            }
            _ => {}
        }

        let regex = match self.compile(&rule) {
            Ok(regex) => regex,
            Err(e) => {
                self.discard(depth);
                return Err(e);
            }
        };

        while let Some(&(d, _)) = self.rulestack.last() {
            if d < depth {
                break;
            }
            self.rulestack.pop();
        }

        let text = rule.kind.is_text();
        let node = self.graph.add_node(rule);
        match self.rulestack.last() {
            Some(&(_, parent)) => {
                self.graph.add_edge(parent, node, ());
            }
            None => self.roots.push(node),
        }
        if let Some(regex) = regex {
            self.regexes.insert(node, regex);
        }
        if let Some(text) = text {
            self.mark(node, text);
        }

        self.rulestack.push((depth, node));
        self.last = Some(node);
        Ok(())
    }

    /// Flag `node` and its ancestors as reading text or binary data.
    fn mark(&mut self, node: NodeIndex, text: bool) {
        let mut next = Some(node);
        while let Some(n) = next {
            if text {
                self.graph[n].text = true;
            } else {
                self.graph[n].binary = true;
            }
            next = self.graph.neighbors_directed(n, Incoming).next();
        }
    }

    fn finish(self) -> MagicSet {
        let mut graph = self.graph;
        let mut roots = BTreeMap::new();
        for node in self.roots {
            let rule = &mut graph[node];
            rule.strength = strength(rule);
            roots.insert((Reverse(rule.strength), rule.line), node);
        }
        MagicSet {
            name: self.name,
            graph,
            roots,
            regexes: self.regexes,
        }
    }
}

impl MagicSet {
    /// A set with no rules; it never matches.
    pub fn empty(name: &str) -> MagicSet {
        MagicSet {
            name: name.to_string(),
            graph: DiGraph::new(),
            roots: BTreeMap::new(),
            regexes: FnvHashMap::default(),
        }
    }

    /// Read rules from `reader`, passing each rejected line to `warn`.
    ///
    /// Only I/O errors abort loading; bad lines are skipped.
    pub fn load<R: BufRead>(mut reader: R, name: &str, warn: &mut dyn FnMut(&Warning)) -> Result<MagicSet> {
        let mut builder = TreeBuilder::new(name, warn);
        let mut raw = Vec::new();
        let mut line = 0u32;
        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            line += 1;
            let text = String::from_utf8_lossy(&raw);
            builder.line(line, text.trim_end_matches(|c: char| c == '\n' || c == '\r'));
        }
        let set = builder.finish();
        debug!("{}: loaded {} rules, {} top-level", set.name, set.len(), set.roots.len());
        Ok(set)
    }

    /// Load rules, logging rejected lines.
    pub fn from_reader<R: BufRead>(reader: R, name: &str) -> Result<MagicSet> {
        MagicSet::load(reader, name, &mut |w: &Warning| warn!("{}", w))
    }

    /// Load rules, failing if any line is rejected.
    pub fn validate<R: BufRead>(reader: R, name: &str) -> Result<MagicSet> {
        let mut warnings = Vec::new();
        let set = MagicSet::load(reader, name, &mut |w: &Warning| warnings.push(w.clone()))?;
        if warnings.is_empty() {
            Ok(set)
        } else {
            Err(Error::InvalidRules {
                name: name.to_string(),
                warnings,
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rules, continuations included.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Top-level rules in evaluation order.
    pub fn roots(&self) -> impl Iterator<Item = &MagicLine> + '_ {
        self.roots.values().map(move |&n| &self.graph[n])
    }

    /// Continuations of `node` in source order.
    pub(crate) fn children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self.graph.neighbors_directed(node, Outgoing).collect();
        children.sort_unstable();
        children
    }

    fn dump_node(&self, node: NodeIndex, out: &mut String) {
        let rule = &self.graph[node];
        out.push_str(&format!(
            "{}{} {}/{}",
            rule.line,
            ">".repeat(rule.depth as usize),
            rule.type_name,
            rule.result.as_ref().map_or("", |r| r.as_str())
        ));
        if let Some(mime) = &rule.mime {
            out.push_str(&format!(" ({})", mime));
        }
        out.push_str(&format!(" [{}]\n", rule.strength));
        for child in self.children(node) {
            self.dump_node(child, out);
        }
    }

    /// Every rule in evaluation order, one per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for &node in self.roots.values() {
            self.dump_node(node, &mut out);
        }
        out
    }
}
