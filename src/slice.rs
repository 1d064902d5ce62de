use crate::{
    address::{Address, Namespace},
    array::{ensure_index, stored_len, FixedArray, IndexOutOfRange, Sequence},
    memory::WordStore,
    state::State,
    value::{StateValue, TypeDescriptor, Value},
    variable::Variable,
};

/// Backing array of generation `g` is `{name}/{g}`. Growth writes generation
/// `g + 1` in full before switching to it.
#[derive(Debug, Clone)]
pub struct Slice {
    namespace: Namespace,
    name: String,
    element: TypeDescriptor,
    length: Variable,
    generation: Variable,
}

impl Slice {
    pub(crate) fn attach(namespace: Namespace, name: String, element: TypeDescriptor) -> Self {
        let length = Variable::at(
            format!("{name}.length"),
            TypeDescriptor::U64,
            Address::derive(namespace, &[&name, "length"]),
        );
        let generation = Variable::at(
            format!("{name}.generation"),
            TypeDescriptor::U64,
            Address::derive(namespace, &[&name, "generation"]),
        );
        Self {
            namespace,
            name,
            element,
            length,
            generation,
        }
    }

    pub(crate) fn allocate<S: WordStore>(
        state: &mut State<S>,
        namespace: Namespace,
        name: String,
        len: usize,
        cap: usize,
        element: TypeDescriptor,
    ) -> anyhow::Result<Self> {
        if len > cap {
            anyhow::bail!(IndexOutOfRange {
                index: len,
                len: cap,
            })
        }
        let slice = Self::attach(namespace, name, element);
        slice.backing_at(0).erase(state);
        FixedArray::allocate(
            state,
            namespace.backing(),
            slice.backing_name(0),
            cap,
            slice.element.clone(),
        )?;
        slice.generation.set(state, 0u64)?;
        slice.length.set(state, len as u64)?;
        Ok(slice)
    }

    pub(crate) fn is_allocated<S: WordStore>(&self, state: &State<S>) -> bool {
        self.length.is_assigned(state)
    }

    fn backing_name(&self, generation: u64) -> String {
        format!("{}/{generation}", self.name)
    }

    fn backing_at(&self, generation: u64) -> FixedArray {
        FixedArray::attach(
            self.namespace.backing(),
            self.backing_name(generation),
            self.element.clone(),
        )
    }

    fn current_generation<S: WordStore>(&self, state: &State<S>) -> u64 {
        self.generation
            .load(state)
            .and_then(|value| value.as_u64())
            .unwrap_or_default()
    }

    fn backing<S: WordStore>(&self, state: &State<S>) -> FixedArray {
        self.backing_at(self.current_generation(state))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    pub fn len<S: WordStore>(&self, state: &State<S>) -> usize {
        stored_len(state, &self.length)
    }

    pub fn is_empty<S: WordStore>(&self, state: &State<S>) -> bool {
        self.len(state) == 0
    }

    pub fn cap<S: WordStore>(&self, state: &State<S>) -> usize {
        self.backing(state).len(state)
    }

    pub fn element<S: WordStore>(&self, state: &State<S>, index: usize) -> anyhow::Result<Variable> {
        ensure_index(index, self.len(state))?;
        self.backing(state).element(state, index)
    }

    pub fn get<S: WordStore>(&self, state: &State<S>, index: usize) -> anyhow::Result<Value> {
        Ok(self.element(state, index)?.get(state))
    }

    pub fn load<S: WordStore>(
        &self,
        state: &State<S>,
        index: usize,
    ) -> anyhow::Result<Option<Value>> {
        Ok(self.element(state, index)?.load(state))
    }

    pub fn get_into<S: WordStore, T: StateValue>(
        &self,
        state: &State<S>,
        index: usize,
        out: &mut T,
    ) -> anyhow::Result<bool> {
        self.element(state, index)?.get_into(state, out)
    }

    pub fn set<S: WordStore>(
        &self,
        state: &mut State<S>,
        index: usize,
        value: impl Into<Value>,
    ) -> anyhow::Result<()> {
        self.element(state, index)?.set(state, value)
    }

    pub fn delete<S: WordStore>(&self, state: &mut State<S>, index: usize) -> anyhow::Result<()> {
        let len = self.len(state);
        self.backing(state).remove_within(state, index, len)?;
        self.length.set(state, (len - 1) as u64)
    }

    pub fn copy_from<S: WordStore>(
        &self,
        state: &mut State<S>,
        source: &impl Sequence,
        dest_from: usize,
        source_from: usize,
        source_to: usize,
    ) -> anyhow::Result<()> {
        let len = self.len(state);
        self.backing(state)
            .copy_within(state, source, dest_from, source_from, source_to, len)
    }

    pub fn append<S: WordStore, V: Into<Value>>(
        &self,
        state: &mut State<S>,
        values: impl IntoIterator<Item = V>,
    ) -> anyhow::Result<()> {
        let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
        for value in &values {
            self.element.check(value)?
        }
        let count = values.len();
        let len = self.len(state);
        let mut backing = self.backing(state);
        let cap = backing.len(state);
        if cap.saturating_sub(len) < count {
            backing = self.grow(state, backing, len, (2 * cap).max(len + count))?
        }
        for (offset, value) in values.into_iter().enumerate() {
            backing.set(state, len + offset, value)?
        }
        self.length.set(state, (len + count) as u64)
    }

    fn grow<S: WordStore>(
        &self,
        state: &mut State<S>,
        old: FixedArray,
        len: usize,
        cap: usize,
    ) -> anyhow::Result<FixedArray> {
        let generation = self.current_generation(state) + 1;
        tracing::debug!(
            "{}: grow capacity {} -> {cap} (generation {generation})",
            self.name,
            old.len(state)
        );
        // leftovers of an interrupted growth
        self.backing_at(generation).erase(state);
        let new = FixedArray::allocate(
            state,
            self.namespace.backing(),
            self.backing_name(generation),
            cap,
            self.element.clone(),
        )?;
        new.copy_from(state, &old, 0, 0, len)?;
        self.generation.set(state, generation)?;
        if state.config().erase_abandoned {
            old.erase(state)
        }
        Ok(new)
    }

    // the vacated slot is not erased
    pub fn pop<S: WordStore>(&self, state: &mut State<S>) -> anyhow::Result<Value> {
        let len = self.len(state);
        if len == 0 {
            anyhow::bail!(IndexOutOfRange { index: 0, len })
        }
        let value = self.get(state, len - 1)?;
        self.length.set(state, (len - 1) as u64)?;
        Ok(value)
    }
}

impl Sequence for Slice {
    fn name(&self) -> &str {
        &self.name
    }

    fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    fn len<S: WordStore>(&self, state: &State<S>) -> usize {
        Slice::len(self, state)
    }

    fn element<S: WordStore>(&self, state: &State<S>, index: usize) -> anyhow::Result<Variable> {
        Slice::element(self, state, index)
    }
}
