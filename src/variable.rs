use crate::{
    address::{Address, Namespace},
    codec,
    memory::WordStore,
    state::State,
    value::{StateValue, TypeDescriptor, Value},
};

#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    ty: TypeDescriptor,
    address: Address,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let name = name.into();
        let address = Address::derive(Namespace::Variable, &[&name]);
        Self { name, ty, address }
    }

    pub(crate) fn at(name: String, ty: TypeDescriptor, address: Address) -> Self {
        Self { name, ty, address }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn is_assigned<S: WordStore>(&self, state: &State<S>) -> bool {
        state.exists(&self.address)
    }

    pub fn delete<S: WordStore>(&self, state: &mut State<S>) {
        state.delete(&self.address)
    }

    pub fn set<S: WordStore>(
        &self,
        state: &mut State<S>,
        value: impl Into<Value>,
    ) -> anyhow::Result<()> {
        let value = value.into();
        self.ty.check(&value)?;
        state.write(&self.address, &codec::encode(&value)?)
    }

    // None also for bytes that no longer decode as `ty`
    pub fn load<S: WordStore>(&self, state: &State<S>) -> Option<Value> {
        if !self.is_assigned(state) {
            return None;
        }
        let value = codec::decode(&state.read(&self.address))
            .and_then(|value| self.ty.check(&value).map(|()| value));
        match value {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("{} at {} is unreadable: {err}", self.name, self.address);
                None
            }
        }
    }

    pub fn get<S: WordStore>(&self, state: &State<S>) -> Value {
        self.load(state)
            .unwrap_or_else(|| self.ty.zero_value())
    }

    /// Reads into `out`, which must be of this variable's type. An unassigned
    /// or unreadable slot stores the zero value and returns false.
    pub fn get_into<S: WordStore, T: StateValue>(
        &self,
        state: &State<S>,
        out: &mut T,
    ) -> anyhow::Result<bool> {
        self.ty.ensure_same_type(&T::descriptor())?;
        let (value, assigned) = match self.load(state) {
            Some(value) => (value, true),
            None => (self.ty.zero_value(), false),
        };
        if let Some(value) = T::from_value(value) {
            *out = value
        }
        Ok(assigned)
    }

    pub fn copy_from<S: WordStore>(
        &self,
        state: &mut State<S>,
        source: &Variable,
    ) -> anyhow::Result<()> {
        self.ty.ensure_same_type(&source.ty)?;
        match source.load(state) {
            Some(value) => self.set(state, value),
            None => {
                self.delete(state);
                Ok(())
            }
        }
    }
}
