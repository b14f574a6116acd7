// Copyright 2025 Cornell University
// released under MIT License

//! Builders for CSP-M text. Everything in here is a pure string transform:
//! none of these functions look at the interaction being generated.

use itertools::Itertools;

pub const SKIP: &str = "SKIP";
pub const STOP: &str = "STOP";

/// `f(a, b)`, or just `f` without arguments
pub fn apply<S: AsRef<str>>(function: &str, args: &[S]) -> String {
    if args.is_empty() {
        function.to_string()
    } else {
        format!("{function}({})", args.iter().map(AsRef::as_ref).join(", "))
    }
}

/// `Ns::ident`
pub fn qualify(namespace: &str, ident: &str) -> String {
    format!("{namespace}::{ident}")
}

pub fn prefix(event: &str, process: &str) -> String {
    format!("{event} -> {process}")
}

pub fn definition(name: &str, body: &str) -> String {
    format!("{name} = {body}")
}

/// Sequential composition. The empty sequence is `SKIP`.
pub fn seq<S: AsRef<str>>(parts: &[S]) -> String {
    if parts.is_empty() {
        SKIP.to_string()
    } else {
        parts.iter().map(AsRef::as_ref).join("; ")
    }
}

pub fn external_choice<S: AsRef<str>>(processes: &[S]) -> String {
    nary("[]", processes, STOP)
}

pub fn internal_choice<S: AsRef<str>>(processes: &[S]) -> String {
    nary("|~|", processes, STOP)
}

pub fn interleave<S: AsRef<str>>(processes: &[S]) -> String {
    nary("|||", processes, SKIP)
}

/// Folds `processes` with `op`, parenthesized as a whole.
/// Zero processes yield the unit of the operator, one process is returned as is.
fn nary<S: AsRef<str>>(op: &str, processes: &[S], unit: &str) -> String {
    match processes {
        [] => unit.to_string(),
        [single] => single.as_ref().to_string(),
        _ => format!(
            "({})",
            processes
                .iter()
                .map(AsRef::as_ref)
                .join(&format!(" {op} "))
        ),
    }
}

pub fn guard(condition: &str, process: &str) -> String {
    format!("{condition} & {process}")
}

pub fn hide(process: &str, events: &str) -> String {
    format!("{process} \\ {events}")
}

/// A set of events given by channel productions: `{| a, b |}`, or `{}`
pub fn event_set<S: AsRef<str>>(channels: &[S]) -> String {
    if channels.is_empty() {
        "{}".to_string()
    } else {
        format!("{{| {} |}}", channels.iter().map(AsRef::as_ref).join(", "))
    }
}

/// An enumerated set: `{a, b}`
pub fn set<S: AsRef<str>>(items: &[S]) -> String {
    format!("{{{}}}", items.iter().map(AsRef::as_ref).join(", "))
}

/// An inline comment, legal anywhere a space is
pub fn comment(text: &str) -> String {
    format!("{{- {text} -}}")
}

/// `channel a, b : T`, or `channel a, b` for data-less channels
pub fn channel<S: AsRef<str>>(names: &[S], tpe: Option<&str>) -> String {
    let names = names.iter().map(AsRef::as_ref).join(", ");
    match tpe {
        Some(tpe) => format!("channel {names} : {tpe}"),
        None => format!("channel {names}"),
    }
}

/// Indents every line of `text` by `level` steps of two spaces
pub fn indent(text: &str, level: usize) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{line}", "  ".repeat(level))
            }
        })
        .join("\n")
}

/// Composes `items` in generalized parallel, nesting to the left:
/// `(... (i1 [| S1 |] i2) [| S2 |] i3 ...) [| Sn-1 |] in`.
/// The alphabet `Sk` joining the first `k` items with item `k + 1` is
/// computed from item `k` and every item that follows it.
///
/// Panics if `items` is empty.
pub fn generalized_parallel<T>(
    items: &[T],
    name_of: impl Fn(&T) -> String,
    sync_of: impl Fn(&T, &[T]) -> String,
) -> String {
    assert!(
        !items.is_empty(),
        "generalized parallel needs at least one process"
    );
    let mut acc = name_of(&items[0]);
    for k in 0..items.len() - 1 {
        let label = sync_of(&items[k], &items[k + 1..]);
        let lhs = if k == 0 { acc } else { format!("({acc})") };
        acc = format!("{lhs} [| {label} |] {}", name_of(&items[k + 1]));
    }
    acc
}

/// A renaming clause accumulated one pair at a time.
/// Pairs are kept in the order they were added; duplicates are not removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renaming {
    pairs: Vec<(String, String)>,
}

impl Renaming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<A, B>(pairs: impl IntoIterator<Item = (A, B)>) -> Self
    where
        A: Into<String>,
        B: Into<String>,
    {
        let mut renaming = Self::new();
        for (from, to) in pairs {
            renaming.add(from, to);
        }
        renaming
    }

    pub fn add(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.pairs.push((from.into(), to.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `P [[ a <- b ]]`, or `P` itself for an empty renaming
    pub fn apply_to(&self, process: &str) -> String {
        if self.is_empty() {
            process.to_string()
        } else {
            format!("{process} {self}")
        }
    }
}

impl std::fmt::Display for Renaming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.pairs.is_empty() {
            return Ok(());
        }
        let pairs = self
            .pairs
            .iter()
            .map(|(from, to)| format!("{from} <- {to}"))
            .join(", ");
        write!(f, "[[ {pairs} ]]")
    }
}

/// ```text
/// let
///   d1
///   d2
/// within
///   body
/// ```
pub fn let_within<S: AsRef<str>>(definitions: &[S], body: &str) -> String {
    let definitions = definitions
        .iter()
        .map(|d| indent(d.as_ref(), 1))
        .join("\n");
    format!("let\n{definitions}\nwithin\n{}", indent(body, 1))
}

/// A CSP-M module with a private part and an exported part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub private: Vec<String>,
    pub public: Vec<String>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_private(&mut self, item: impl Into<String>) -> &mut Self {
        self.private.push(item.into());
        self
    }

    pub fn add_public(&mut self, item: impl Into<String>) -> &mut Self {
        self.public.push(item.into());
        self
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "module {}", self.name)?;
        for item in &self.private {
            writeln!(f, "{}", indent(item, 1))?;
        }
        writeln!(f, "exports")?;
        for item in &self.public {
            writeln!(f, "{}", indent(item, 1))?;
        }
        write!(f, "endmodule")
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn compose(items: &[&str]) -> String {
        generalized_parallel(
            items,
            |item| item.to_string(),
            |item, rest| format!("{item}:[{}]", rest.join(", ")),
        )
    }

    #[test]
    fn generalized_parallel_single_item_is_identity() {
        assert_eq!(compose(&["A"]), "A");
    }

    #[test]
    fn generalized_parallel_nests_left() {
        assert_eq!(compose(&["A", "B"]), "A [| A:[B] |] B");
        assert_eq!(
            compose(&["A", "B", "C"]),
            "(A [| A:[B, C] |] B) [| B:[C] |] C"
        );
        assert_eq!(
            compose(&["A", "B", "C", "D"]),
            "((A [| A:[B, C, D] |] B) [| B:[C, D] |] C) [| C:[D] |] D"
        );
    }

    #[test]
    #[should_panic(expected = "at least one process")]
    fn generalized_parallel_rejects_empty() {
        compose(&[]);
    }

    #[test]
    fn renaming_clause() {
        assert_eq!(Renaming::new().to_string(), "");
        assert_eq!(Renaming::new().apply_to("P"), "P");

        let mut incremental = Renaming::new();
        incremental.add("a", "b");
        incremental.add("c", "d");
        let fixed = Renaming::from_pairs([("a", "b"), ("c", "d")]);
        assert_eq!(incremental.to_string(), "[[ a <- b, c <- d ]]");
        assert_eq!(incremental, fixed);
        assert_eq!(fixed.apply_to("P"), "P [[ a <- b, c <- d ]]");

        // no deduplication
        let twice = Renaming::from_pairs([("a", "b"), ("a", "b")]);
        assert_eq!(twice.to_string(), "[[ a <- b, a <- b ]]");
    }

    #[test]
    fn choices_and_sequences() {
        let empty: [&str; 0] = [];
        assert_eq!(external_choice(&empty), "STOP");
        assert_eq!(internal_choice(&["P"]), "P");
        assert_eq!(external_choice(&["P", "Q", "R"]), "(P [] Q [] R)");
        assert_eq!(internal_choice(&["P", "Q"]), "(P |~| Q)");
        assert_eq!(interleave(&empty), "SKIP");
        assert_eq!(interleave(&["P", "Q"]), "(P ||| Q)");
        assert_eq!(seq(&empty), "SKIP");
        assert_eq!(seq(&["a -> SKIP", "b -> SKIP"]), "a -> SKIP; b -> SKIP");
    }

    #[test]
    fn sets_channels_and_names() {
        let empty: [&str; 0] = [];
        assert_eq!(event_set(&empty), "{}");
        assert_eq!(event_set(&["a", "b.in"]), "{| a, b.in |}");
        assert_eq!(set(&["tock"]), "{tock}");
        assert_eq!(channel(&["get_x", "set_x"], Some("Int")), "channel get_x, set_x : Int");
        assert_eq!(channel(&["tock"], None), "channel tock");
        assert_eq!(apply("Loop", &empty), "Loop");
        assert_eq!(apply("BoundedLoopRange", &["4", "6"]), "BoundedLoopRange(4, 6)");
        assert_eq!(qualify("Seqs", "Target"), "Seqs::Target");
        assert_eq!(comment("no bounds"), "{- no bounds -}");
        assert_eq!(hide("P", "{| c |}"), "P \\ {| c |}");
        assert_eq!(guard("x > 0", "P"), "x > 0 & P");
    }

    #[test]
    fn let_within_block() {
        let block = let_within(&["A = a -> A", "B = b -> B"], "A ||| B");
        assert_eq!(block, "let\n  A = a -> A\n  B = b -> B\nwithin\n  A ||| B");
    }

    #[test]
    fn module_sections() {
        let mut module = Module::new("M");
        module.add_private("P = SKIP").add_public("channel c").add_public("Q = c -> P");
        insta::assert_snapshot!(module.to_string(), @r"
        module M
          P = SKIP
        exports
          channel c
          Q = c -> P
        endmodule
        ");
    }
}
