use crate::{
    address::{Address, Namespace},
    memory::WordStore,
    state::State,
    value::{StateValue, TypeDescriptor, Value},
    variable::Variable,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display(fmt = "IndexOutOfRange: index {index} with length {len}")]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

pub trait Sequence {
    fn name(&self) -> &str;

    fn element_type(&self) -> &TypeDescriptor;

    fn len<S: WordStore>(&self, state: &State<S>) -> usize;

    fn element<S: WordStore>(&self, state: &State<S>, index: usize) -> anyhow::Result<Variable>;
}

pub(crate) fn stored_len<S: WordStore>(state: &State<S>, length: &Variable) -> usize {
    length
        .load(state)
        .and_then(|value| value.as_u64())
        .unwrap_or_default() as usize
}

pub(crate) fn ensure_index(index: usize, len: usize) -> anyhow::Result<()> {
    if index >= len {
        anyhow::bail!(IndexOutOfRange { index, len })
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct FixedArray {
    namespace: Namespace,
    name: String,
    element: TypeDescriptor,
    length: Variable,
}

impl FixedArray {
    pub(crate) fn attach(namespace: Namespace, name: String, element: TypeDescriptor) -> Self {
        let length = Variable::at(
            format!("{name}.length"),
            TypeDescriptor::U64,
            Address::derive(namespace, &[&name, "length"]),
        );
        Self {
            namespace,
            name,
            element,
            length,
        }
    }

    pub(crate) fn allocate<S: WordStore>(
        state: &mut State<S>,
        namespace: Namespace,
        name: String,
        len: usize,
        element: TypeDescriptor,
    ) -> anyhow::Result<Self> {
        let array = Self::attach(namespace, name, element);
        array.length.set(state, len as u64)?;
        Ok(array)
    }

    pub(crate) fn is_allocated<S: WordStore>(&self, state: &State<S>) -> bool {
        self.length.is_assigned(state)
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

    // unchecked
    fn slot(&self, index: usize) -> Variable {
        let index = index.to_string();
        Variable::at(
            format!("{}[{index}]", self.name),
            self.element.clone(),
            Address::derive(self.namespace, &[&self.name, &index]),
        )
    }

    pub fn element<S: WordStore>(&self, state: &State<S>, index: usize) -> anyhow::Result<Variable> {
        ensure_index(index, self.len(state))?;
        Ok(self.slot(index))
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

    /// Shifts later elements to the front; the length is unchanged.
    pub fn delete<S: WordStore>(&self, state: &mut State<S>, index: usize) -> anyhow::Result<()> {
        let len = self.len(state);
        self.remove_within(state, index, len)
    }

    pub(crate) fn remove_within<S: WordStore>(
        &self,
        state: &mut State<S>,
        index: usize,
        end: usize,
    ) -> anyhow::Result<()> {
        ensure_index(index, end)?;
        if index + 1 < end {
            tracing::debug!("{}: shift {} elements after {index}", self.name, end - index - 1);
            for i in index..end - 1 {
                self.slot(i).copy_from(state, &self.slot(i + 1))?
            }
        }
        self.slot(end - 1).delete(state);
        Ok(())
    }

    // all bounds and types are checked before the first write
    pub fn copy_from<S: WordStore>(
        &self,
        state: &mut State<S>,
        source: &impl Sequence,
        dest_from: usize,
        source_from: usize,
        source_to: usize,
    ) -> anyhow::Result<()> {
        let len = self.len(state);
        self.copy_within(state, source, dest_from, source_from, source_to, len)
    }

    pub(crate) fn copy_within<S: WordStore>(
        &self,
        state: &mut State<S>,
        source: &impl Sequence,
        dest_from: usize,
        source_from: usize,
        source_to: usize,
        dest_len: usize,
    ) -> anyhow::Result<()> {
        self.element.ensure_same_type(source.element_type())?;
        let source_len = source.len(state);
        if source_from > source_to {
            anyhow::bail!(IndexOutOfRange {
                index: source_from,
                len: source_to,
            })
        }
        if source_to > source_len {
            anyhow::bail!(IndexOutOfRange {
                index: source_to,
                len: source_len,
            })
        }
        let count = source_to - source_from;
        if dest_from > dest_len || count > dest_len - dest_from {
            anyhow::bail!(IndexOutOfRange {
                index: dest_from.saturating_add(count),
                len: dest_len,
            })
        }
        for offset in 0..count {
            let from = source.element(state, source_from + offset)?;
            self.slot(dest_from + offset).copy_from(state, &from)?
        }
        Ok(())
    }

    pub(crate) fn erase<S: WordStore>(&self, state: &mut State<S>) {
        for index in 0..self.len(state) {
            self.slot(index).delete(state)
        }
        self.length.delete(state)
    }
}

impl Sequence for FixedArray {
    fn name(&self) -> &str {
        &self.name
    }

    fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    fn len<S: WordStore>(&self, state: &State<S>) -> usize {
        FixedArray::len(self, state)
    }

    fn element<S: WordStore>(&self, state: &State<S>, index: usize) -> anyhow::Result<Variable> {
        FixedArray::element(self, state, index)
    }
}
