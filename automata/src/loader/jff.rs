//! JFLAP `.jff` interchange for finite automata.

use std::{borrow::Cow, collections::HashSet, fmt::Display};

use crate::{
    automaton::{AutomatonSpec, EPSILON, FaTransition, Machine, State, Symbol},
    error::Error,
    loader::{Context, Spanned, log::LogSink, parser},
};

/// Reads a finite automaton out of `ctx`'s source. Warnings for recoverable
/// problems are left in `ctx`; any error fails the whole import.
pub fn load(ctx: &mut Context<'_>) -> Result<AutomatonSpec, Error> {
    let Some(Spanned(root, root_span)) = parser::parse(ctx) else {
        return Err(ctx.to_error());
    };
    if ctx.contains_errors() {
        return Err(ctx.to_error());
    }

    if root.name.0 != "structure" {
        ctx.emit_error(
            format!("expected a <structure> root, found <{}>", root.name.0),
            root.name.1,
        );
        return Err(ctx.to_error());
    }
    let root = Spanned(&root, root_span);

    let Some(kind) = root.expect_child("type", ctx) else {
        return Err(ctx.to_error());
    };
    let kind = kind.0.text();
    if kind.trim() != "fa" {
        return Err(Error::UnsupportedStructure(kind.trim().to_owned()));
    }

    // files written by older versions put states directly under <structure>
    let container = root.0.child("automaton").unwrap_or(root);

    let mut states = Vec::new();
    let mut ids = Vec::new();
    let mut start = None;
    let mut finals = Vec::new();
    for element in container.0.children_named("state") {
        let Some(id) = element.expect_attribute("id", ctx) else {
            continue;
        };
        let name = match element.0.attribute("name") {
            Some(name) => State::new(name.0.as_ref()),
            None => {
                let fallback = State::new(format!("q{}", id.0.trim()));
                ctx.emit_warning(format!("state without a name, using {fallback}"), element.1);
                fallback
            }
        };

        if element.0.has_child("initial") {
            start = Some(name.clone());
        }
        if element.0.has_child("final") {
            finals.push(name.clone());
        }
        ids.push((id.0.trim().to_owned(), name.clone()));
        states.push(name);
    }

    let resolve = |id: &str| {
        ids.iter()
            .find(|(known, _)| known == id.trim())
            .map(|(_, name)| name.clone())
    };

    let mut transitions = Vec::new();
    for element in container.0.children_named("transition") {
        let text = |name| element.0.child(name).map_or(Cow::Borrowed(""), |c| c.0.text());
        let (from, to) = (text("from"), text("to"));
        let (Some(from), Some(to)) = (resolve(from.as_ref()), resolve(to.as_ref())) else {
            ctx.emit_warning(
                format!("transition from {from:?} to {to:?} does not connect declared states"),
                element.1,
            )
            .emit_help_locless("the transition was dropped");
            continue;
        };
        transitions.push(FaTransition {
            from,
            symbol: Symbol::optional(text("read")),
            to,
        });
    }

    if ctx.contains_errors() {
        return Err(ctx.to_error());
    }

    // an ε-edge alone already needs NFA semantics to keep the language
    let mut seen = HashSet::new();
    let non_deterministic = !transitions
        .iter()
        .all(|t| t.symbol.is_some() && seen.insert((&t.from, t.symbol.as_ref())));

    let mut alphabet: Vec<Symbol> = Vec::new();
    for symbol in transitions.iter().filter_map(|t| t.symbol.as_ref()) {
        if !alphabet.contains(symbol) {
            alphabet.push(symbol.clone());
        }
    }
    alphabet.push(Symbol::new(EPSILON));

    let machine = if non_deterministic {
        Machine::Nfa { transitions }
    } else {
        Machine::Dfa { transitions }
    };
    Ok(AutomatonSpec {
        machine,
        alphabet,
        states,
        start,
        finals,
        rejects: Vec::new(),
    })
}

pub fn import(src: &str) -> Result<AutomatonSpec, Error> {
    load(&mut Context::new(src))
}

/// Renders a DFA or NFA as a JFLAP document. States are numbered by their
/// position; transitions touching undeclared states are left out.
pub fn export(spec: &AutomatonSpec) -> Result<String, Error> {
    if !spec.kind().is_finite() {
        return Err(Error::WrongKind {
            operation: "JFLAP export",
            expected: "a DFA or NFA",
            found: spec.kind(),
        });
    }
    Ok(Document(spec).to_string())
}

struct Document<'a>(&'a AutomatonSpec);

impl<'a> Display for Document<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let spec = self.0;
        writeln!(
            f,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#
        )?;
        writeln!(
            f,
            r#"<!DOCTYPE structure PUBLIC "-//JFLAP//DTD JFLAP 2008 XML//EN" "http://www.jflap.org/jflap.dtd">"#
        )?;
        writeln!(f, "<structure>")?;
        writeln!(f, "  <type>fa</type>")?;
        writeln!(f, "  <automaton>")?;

        for (id, state) in spec.states.iter().enumerate() {
            writeln!(f, r#"    <state id="{id}" name="{}">"#, escape(state.as_str()))?;
            if spec.start.as_ref() == Some(state) {
                writeln!(f, "      <initial/>")?;
            }
            if spec.is_final(state) {
                writeln!(f, "      <final/>")?;
            }
            writeln!(f, "    </state>")?;
        }

        let id_of = |state: &State| spec.states.iter().position(|s| s == state);
        for t in spec.machine.fa_transitions().unwrap_or_default() {
            let (Some(from), Some(to)) = (id_of(&t.from), id_of(&t.to)) else {
                continue;
            };
            let read = t.symbol.as_ref().map_or(Cow::Borrowed(""), |s| escape(s.as_str()));
            writeln!(f, "    <transition>")?;
            writeln!(f, "      <from>{from}</from>")?;
            writeln!(f, "      <to>{to}</to>")?;
            writeln!(f, "      <read>{read}</read>")?;
            writeln!(f, "    </transition>")?;
        }

        writeln!(f, "  </automaton>")?;
        write!(f, "</structure>")
    }
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kind, automaton::fa, loader::log::LogLevel, presets};

    const WORDS: [&str; 12] = [
        "", "a", "b", "ab", "ba", "aab", "abb", "bab", "aabb", "abab", "bba", "aaabbb",
    ];

    fn run(spec: &AutomatonSpec, word: &str) -> bool {
        match spec.kind() {
            Kind::Dfa => fa::simulate_dfa(spec, word).unwrap().accepted,
            _ => fa::simulate_nfa(spec, word).unwrap().accepted,
        }
    }

    #[test]
    fn round_trip_preserves_language() {
        for spec in [presets::dfa_a_star_b_star(), presets::nfa_example()] {
            let back = import(&export(&spec).unwrap()).unwrap();
            assert_eq!(back.states, spec.states);
            assert_eq!(back.start, spec.start);
            assert_eq!(back.finals, spec.finals);
            for word in WORDS {
                assert_eq!(run(&spec, word), run(&back, word), "{word:?}");
            }
        }
    }

    #[test]
    fn export_layout() {
        let xml = export(&presets::dfa_a_star_b_star()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>"));
        assert!(xml.contains("<type>fa</type>"));
        assert!(xml.contains("<state id=\"0\" name=\"q0\">\n      <initial/>\n      <final/>"));
        assert!(xml.contains("<from>0</from>\n      <to>1</to>\n      <read>b</read>"));
        assert!(xml.ends_with("</structure>"));
    }

    #[test]
    fn epsilon_and_escaping() {
        let spec = AutomatonSpec::new(Machine::Nfa {
            transitions: vec![
                FaTransition::new("a<b", "ε", "\"q\""),
                FaTransition::new("a<b", "&", "\"q\""),
                FaTransition::new("a<b", "x", "undeclared"),
            ],
        })
        .with_alphabet(["&", "ε"])
        .with_states(["a<b", "\"q\""])
        .with_start("a<b")
        .with_finals(["\"q\""]);

        let xml = export(&spec).unwrap();
        assert!(xml.contains("name=\"a&lt;b\""));
        assert!(xml.contains("<read></read>"));
        assert!(xml.contains("<read>&amp;</read>"));
        assert!(!xml.contains("<read>x</read>"));

        let back = import(&xml).unwrap();
        assert_eq!(back.kind(), Kind::Nfa);
        assert_eq!(back.states, spec.states);
        assert_eq!(back.alphabet, vec![Symbol::from("&"), Symbol::from("ε")]);
        assert_eq!(
            back.machine.fa_transitions().unwrap(),
            &spec.machine.fa_transitions().unwrap()[..2]
        );
    }

    #[test]
    fn only_finite_automata_export() {
        assert_eq!(
            export(&presets::pda_anbn()),
            Err(Error::WrongKind {
                operation: "JFLAP export",
                expected: "a DFA or NFA",
                found: Kind::Pda
            })
        );
    }

    #[test]
    fn unsupported_type() {
        let src = "<structure><type>pda</type><automaton/></structure>";
        assert_eq!(import(src), Err(Error::UnsupportedStructure("pda".into())));
    }

    #[test]
    fn infers_kind_and_alphabet() {
        let src = r#"<structure>
  <type>fa</type>
  <automaton>
    <state id="0" name="s"><initial/></state>
    <state id="1" name="t"><final/></state>
    <transition><from>0</from><to>1</to><read>b</read></transition>
    <transition><from>0</from><to>0</to><read>a</read></transition>
    <transition><from>1</from><to>1</to><read>a</read></transition>
  </automaton>
</structure>"#;
        let spec = import(src).unwrap();
        assert_eq!(spec.kind(), Kind::Dfa);
        assert_eq!(
            spec.alphabet,
            vec![Symbol::from("b"), Symbol::from("a"), Symbol::from("ε")]
        );
        assert!(spec.rejects.is_empty());

        let repeated = src.replace("<to>0</to><read>a</read>", "<to>0</to><read>b</read>");
        assert_eq!(import(&repeated).unwrap().kind(), Kind::Nfa);

        let epsilon = src.replace("<to>1</to><read>a</read>", "<to>1</to><read/>");
        let spec = import(&epsilon).unwrap();
        assert_eq!(spec.kind(), Kind::Nfa);
        assert_eq!(spec.machine.fa_transitions().unwrap()[2].symbol, None);
    }

    #[test]
    fn older_layout_and_recoverable_problems() {
        let src = r#"<?xml version="1.0"?><!--Created with JFLAP 6.4.-->
<structure>
  <type>fa</type>
  <state id="0"><initial/><final/></state>
  <state id="1" name="q1"/>
  <transition><from>0</from><to>1</to><read>a</read></transition>
  <transition><from>0</from><to>7</to><read>a</read></transition>
</structure>"#;
        let mut ctx = Context::new(src);
        let spec = load(&mut ctx).unwrap();
        assert_eq!(spec.states, vec![State::from("q0"), State::from("q1")]);
        assert_eq!(spec.start, Some(State::from("q0")));
        assert_eq!(spec.machine.len(), 1);

        let warnings: Vec<&str> = ctx
            .logs()
            .entries()
            .iter()
            .filter(|e| e.level == LogLevel::Warning)
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(
            warnings,
            [
                "state without a name, using q0",
                "transition from \"0\" to \"7\" does not connect declared states"
            ]
        );
    }

    #[test]
    fn malformed_documents_fail() {
        let Err(Error::Malformed(messages)) = import("<structure><type>fa</type>") else {
            panic!("expected a parse failure");
        };
        assert_eq!(messages, ["1:1: unclosed tag <structure>"]);

        let Err(Error::Malformed(messages)) = import("<automaton/>") else {
            panic!("expected a root failure");
        };
        assert_eq!(messages, ["1:1: expected a <structure> root, found <automaton>"]);

        let src = "<structure><type>fa</type><state name=\"x\"/></structure>";
        let Err(Error::Malformed(messages)) = import(src) else {
            panic!("expected a missing id failure");
        };
        assert_eq!(messages.len(), 1);
        assert!(messages[0].ends_with("<state> is missing the \"id\" attribute"));
    }
}
