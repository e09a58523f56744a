use std::borrow::Cow;

use super::Spanned;
use crate::loader::{Context, log::LogSink};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: Spanned<&'a str>,
    pub value: Spanned<Cow<'a, str>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<'a> {
    Element(Element<'a>),
    /// Decoded character data, CDATA sections included.
    Text(Cow<'a, str>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element<'a> {
    pub name: Spanned<&'a str>,
    pub attributes: Vec<Attribute<'a>>,
    pub children: Vec<Spanned<Node<'a>>>,
}

impl<'a> Element<'a> {
    pub fn new(name: Spanned<&'a str>) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Spanned<Cow<'a, str>>> {
        self.attributes
            .iter()
            .find(|attr| attr.name.0 == name)
            .map(|attr| &attr.value)
    }

    pub fn elements(&self) -> impl Iterator<Item = Spanned<&Element<'a>>> {
        self.children.iter().filter_map(|child| match child {
            Spanned(Node::Element(element), span) => Some(Spanned(element, *span)),
            Spanned(Node::Text(_), _) => None,
        })
    }

    pub fn children_named<'s>(
        &'s self,
        name: &'s str,
    ) -> impl Iterator<Item = Spanned<&'s Element<'a>>> {
        self.elements().filter(move |element| element.0.name.0 == name)
    }

    pub fn child(&self, name: &str) -> Option<Spanned<&Element<'a>>> {
        self.elements().find(|element| element.0.name.0 == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Concatenated text of the direct children.
    pub fn text(&self) -> Cow<'a, str> {
        let mut texts = self.children.iter().filter_map(|child| match &child.0 {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        });
        let Some(first) = texts.next() else {
            return Cow::Borrowed("");
        };
        let mut text = first.clone();
        for more in texts {
            text.to_mut().push_str(more);
        }
        text
    }
}

impl<'a> Spanned<&Element<'a>> {
    pub fn expect_child(&self, name: &str, ctx: &mut Context<'a>) -> Option<Spanned<&Element<'a>>> {
        let child = self.0.child(name);
        if child.is_none() {
            ctx.emit_error(
                format!("<{}> is missing a <{name}> element", self.0.name.0),
                self.0.name.1,
            );
        }
        child
    }

    pub fn expect_attribute(
        &self,
        name: &str,
        ctx: &mut Context<'a>,
    ) -> Option<Spanned<Cow<'a, str>>> {
        let value = self.0.attribute(name).cloned();
        if value.is_none() {
            ctx.emit_error(
                format!("<{}> is missing the {name:?} attribute", self.0.name.0),
                self.0.name.1,
            );
        }
        value
    }
}
