use crate::{
    address::{Address, Namespace},
    codec,
    memory::WordStore,
    state::State,
    value::{StateValue, TypeDescriptor, Value},
    variable::Variable,
};

/// Hashed map: each entry is a [`Variable`] addressed by the map name and the
/// canonical encoding of its key. Membership is whether that variable is
/// assigned; keys cannot be enumerated.
#[derive(Debug, Clone)]
pub struct Map {
    namespace: Namespace,
    name: String,
    key: TypeDescriptor,
    value: TypeDescriptor,
}

impl Map {
    pub(crate) fn attach(
        namespace: Namespace,
        name: String,
        key: TypeDescriptor,
        value: TypeDescriptor,
    ) -> Self {
        Self {
            namespace,
            name,
            key,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_type(&self) -> &TypeDescriptor {
        &self.key
    }

    pub fn value_type(&self) -> &TypeDescriptor {
        &self.value
    }

    pub fn entry(&self, key: &Value) -> anyhow::Result<Variable> {
        self.key.check(key)?;
        let encoded = hex::encode(codec::encode(key)?);
        Ok(Variable::at(
            format!("{}[{key}]", self.name),
            self.value.clone(),
            Address::derive(self.namespace, &[&self.name, &encoded]),
        ))
    }

    pub fn set<S: WordStore>(
        &self,
        state: &mut State<S>,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> anyhow::Result<()> {
        self.entry(&key.into())?.set(state, value)
    }

    pub fn get<S: WordStore>(
        &self,
        state: &State<S>,
        key: impl Into<Value>,
    ) -> anyhow::Result<Option<Value>> {
        Ok(self.entry(&key.into())?.load(state))
    }

    /// Reads the value of `key` into `out`; on a miss `out` is untouched and
    /// the result is false.
    pub fn get_into<S: WordStore, T: StateValue>(
        &self,
        state: &State<S>,
        key: impl Into<Value>,
        out: &mut T,
    ) -> anyhow::Result<bool> {
        self.value.ensure_same_type(&T::descriptor())?;
        let entry = self.entry(&key.into())?;
        if !entry.is_assigned(state) {
            return Ok(false);
        }
        entry.get_into(state, out)
    }

    pub fn contains<S: WordStore>(
        &self,
        state: &State<S>,
        key: impl Into<Value>,
    ) -> anyhow::Result<bool> {
        Ok(self.entry(&key.into())?.is_assigned(state))
    }

    pub fn delete<S: WordStore>(
        &self,
        state: &mut State<S>,
        key: impl Into<Value>,
    ) -> anyhow::Result<()> {
        self.entry(&key.into())?.delete(state);
        Ok(())
    }
}
