// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Chainable attribute queries over score slots and interval results.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use crate::rational::Rational;

/// The value of a named attribute, ordered so it can be grouped and sorted by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attr {
    Int(i64),
    Time(Rational),
    Text(String),
}

impl From<i64> for Attr {
    fn from(int: i64) -> Self {
        Attr::Int(int)
    }
}

impl From<Rational> for Attr {
    fn from(time: Rational) -> Self {
        Attr::Time(time)
    }
}

impl From<&str> for Attr {
    fn from(text: &str) -> Self {
        Attr::Text(text.to_owned())
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Int(int) => write!(f, "{}", int),
            Attr::Time(time) => write!(f, "{}", time),
            Attr::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Anything that exposes named attributes.
pub trait Attributed {
    fn attribute(&self, name: &str) -> Option<Attr>;
}

/// An ordered list of query results.
///
/// Every query returns a new `Query`, the source is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<T> {
    items: Vec<T>,
}

impl<T> Query<T> {
    pub fn new() -> Self {
        Query { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Query<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for Query<T> {
    fn from(items: Vec<T>) -> Self {
        Query { items }
    }
}

impl<T> std::iter::FromIterator<T> for Query<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Query {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Query<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Query<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Attributed + Clone> Query<T> {
    /// Group the items by the value of an attribute, keeping their order
    /// within each group. Items without the attribute are left out.
    pub fn group_by_attribute(&self, name: &str) -> BTreeMap<Attr, Query<T>> {
        let mut groups: BTreeMap<Attr, Query<T>> = BTreeMap::new();
        for item in self.items.iter() {
            if let Some(value) = item.attribute(name) {
                groups.entry(value).or_default().push(item.clone());
            }
        }
        groups
    }

    /// Items that have the attribute, and if `value` is given, where it equals `value`.
    pub fn select_by_attribute(&self, name: &str, value: Option<&Attr>) -> Query<T> {
        self.items
            .iter()
            .filter(|item| match (item.attribute(name), value) {
                (Some(actual), Some(expected)) => actual == *expected,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .cloned()
            .collect()
    }

    /// Stable sort by an attribute. Items without it come first.
    pub fn sort_by_attribute(&self, name: &str) -> Query<T> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.attribute(name));
        Query { items }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, i64);

    impl Attributed for Item {
        fn attribute(&self, name: &str) -> Option<Attr> {
            match name {
                "name" => Some(Attr::from(self.0)),
                "level" if self.1 >= 0 => Some(Attr::Int(self.1)),
                _ => None,
            }
        }
    }

    fn items() -> Query<Item> {
        vec![Item("a", 2), Item("b", 1), Item("c", 2), Item("d", -1)].into()
    }

    #[test]
    fn group_keeps_order_and_skips_missing() {
        let groups = items().group_by_attribute("level");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&Attr::Int(2)].to_vec(), vec![Item("a", 2), Item("c", 2)]);
        assert_eq!(groups[&Attr::Int(1)].to_vec(), vec![Item("b", 1)]);
    }

    #[test]
    fn select_with_and_without_value() {
        let q = items();
        assert_eq!(q.select_by_attribute("level", None).len(), 3);
        let twos = q.select_by_attribute("level", Some(&Attr::Int(2)));
        assert_eq!(twos.to_vec(), vec![Item("a", 2), Item("c", 2)]);
        // chainable, and the source is untouched
        assert_eq!(twos.select_by_attribute("name", Some(&Attr::from("c"))).len(), 1);
        assert_eq!(q.len(), 4);
    }

    #[test]
    fn sort_is_stable_with_missing_first() {
        let sorted = items().sort_by_attribute("level");
        let names: Vec<_> = sorted.iter().map(|item| item.0).collect();
        assert_eq!(names, vec!["d", "b", "a", "c"]);
    }
}
