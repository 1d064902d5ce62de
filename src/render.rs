//! Human-readable dumps of container contents, built on the public read
//! operations only.

use std::fmt::Write;

use crate::{
    array::FixedArray, iterable_map::IterableMap, memory::WordStore, slice::Slice, state::State,
    value::Value, variable::Variable,
};

fn elements<S: WordStore>(
    state: &State<S>,
    len: usize,
    get: impl Fn(&State<S>, usize) -> anyhow::Result<Value>,
) -> anyhow::Result<String> {
    let mut rendered = String::from("[");
    for index in 0..len {
        if index != 0 {
            rendered += ", "
        }
        write!(rendered, "{}", get(state, index)?)?
    }
    rendered += "]";
    Ok(rendered)
}

pub fn variable<S: WordStore>(state: &State<S>, variable: &Variable) -> String {
    format!(
        "{} {} => {}",
        variable.name(),
        variable.address(),
        variable.get(state)
    )
}

pub fn array<S: WordStore>(state: &State<S>, array: &FixedArray) -> anyhow::Result<String> {
    let len = array.len(state);
    Ok(format!(
        "{} len: {len} {}",
        array.name(),
        elements(state, len, |state, index| array.get(state, index))?
    ))
}

pub fn slice<S: WordStore>(state: &State<S>, slice: &Slice) -> anyhow::Result<String> {
    let len = slice.len(state);
    Ok(format!(
        "{} len: {len}, cap: {} {}",
        slice.name(),
        slice.cap(state),
        elements(state, len, |state, index| slice.get(state, index))?
    ))
}

pub fn iterable_map<S: WordStore>(state: &State<S>, map: &IterableMap) -> anyhow::Result<String> {
    let mut entries = String::new();
    for (index, (key, value)) in map.entries(state)?.into_iter().enumerate() {
        if index != 0 {
            entries += ", "
        }
        write!(entries, "{key}: {value}")?
    }
    Ok(format!("{} len: {} {{{entries}}}", map.name(), map.len(state)))
}
