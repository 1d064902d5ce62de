use std::ops::ControlFlow;

use crate::{
    address::Namespace,
    array::IndexOutOfRange,
    codec,
    map::Map,
    memory::WordStore,
    slice::Slice,
    state::State,
    value::{StateValue, TypeDescriptor, Value},
};

/// [`Map`] plus a [`Slice`] of its keys in first-insertion order.
#[derive(Debug, Clone)]
pub struct IterableMap {
    data: Map,
    keys: Slice,
}

impl IterableMap {
    pub(crate) fn attach(name: String, key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self {
            keys: Slice::attach(Namespace::IterableMapKeys, name.clone(), key.clone()),
            data: Map::attach(Namespace::IterableMap, name, key, value),
        }
    }

    pub(crate) fn allocate<S: WordStore>(
        state: &mut State<S>,
        name: String,
        key: TypeDescriptor,
        value: TypeDescriptor,
    ) -> anyhow::Result<Self> {
        let cap = state.config().key_capacity;
        Ok(Self {
            keys: Slice::allocate(
                state,
                Namespace::IterableMapKeys,
                name.clone(),
                0,
                cap,
                key.clone(),
            )?,
            data: Map::attach(Namespace::IterableMap, name, key, value),
        })
    }

    pub(crate) fn is_allocated<S: WordStore>(&self, state: &State<S>) -> bool {
        self.keys.is_allocated(state)
    }

    pub fn name(&self) -> &str {
        self.data.name()
    }

    pub fn key_type(&self) -> &TypeDescriptor {
        self.data.key_type()
    }

    pub fn value_type(&self) -> &TypeDescriptor {
        self.data.value_type()
    }

    pub fn len<S: WordStore>(&self, state: &State<S>) -> usize {
        self.keys.len(state)
    }

    pub fn is_empty<S: WordStore>(&self, state: &State<S>) -> bool {
        self.len(state) == 0
    }

    pub fn set<S: WordStore>(
        &self,
        state: &mut State<S>,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> anyhow::Result<()> {
        let key = key.into();
        let value = value.into();
        self.data.value_type().check(&value)?;
        if !self.data.contains(state, key.clone())? {
            self.keys.append(state, [key.clone()])?
        }
        self.data.set(state, key, value)
    }

    pub fn get<S: WordStore>(
        &self,
        state: &State<S>,
        key: impl Into<Value>,
    ) -> anyhow::Result<Option<Value>> {
        self.data.get(state, key)
    }

    pub fn get_into<S: WordStore, T: StateValue>(
        &self,
        state: &State<S>,
        key: impl Into<Value>,
        out: &mut T,
    ) -> anyhow::Result<bool> {
        self.data.get_into(state, key, out)
    }

    pub fn contains<S: WordStore>(
        &self,
        state: &State<S>,
        key: impl Into<Value>,
    ) -> anyhow::Result<bool> {
        self.data.contains(state, key)
    }

    /// # Panics
    ///
    /// When the key is in the map but missing from the key list.
    pub fn delete<S: WordStore>(
        &self,
        state: &mut State<S>,
        key: impl Into<Value>,
    ) -> anyhow::Result<()> {
        let key = key.into();
        if !self.data.contains(state, key.clone())? {
            return Ok(());
        }
        self.data.delete(state, key.clone())?;
        let encoded = codec::encode(&key)?;
        for index in 0..self.keys.len(state) {
            if codec::encode(&self.keys.get(state, index)?)? == encoded {
                return self.keys.delete(state, index);
            }
        }
        panic!(
            "invariant violation: key {key} of {} missing from its key list",
            self.name()
        )
    }

    pub fn index<S: WordStore>(
        &self,
        state: &State<S>,
        index: usize,
    ) -> anyhow::Result<(Value, Value)> {
        let len = self.len(state);
        if index >= len {
            anyhow::bail!(IndexOutOfRange { index, len })
        }
        let key = self.keys.get(state, index)?;
        let value = match self.data.get(state, key.clone())? {
            Some(value) => value,
            None => self.value_type().zero_value(),
        };
        Ok((key, value))
    }

    pub fn range<S: WordStore>(
        &self,
        state: &State<S>,
        mut visit: impl FnMut(&Value, &Value) -> ControlFlow<()>,
    ) -> anyhow::Result<()> {
        for index in 0..self.len(state) {
            let (key, value) = self.index(state, index)?;
            if visit(&key, &value).is_break() {
                break;
            }
        }
        Ok(())
    }

    pub fn entries<S: WordStore>(&self, state: &State<S>) -> anyhow::Result<Vec<(Value, Value)>> {
        (0..self.len(state))
            .map(|index| self.index(state, index))
            .collect()
    }
}
