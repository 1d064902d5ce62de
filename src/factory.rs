//! Constructors that create or attach containers by name.
//!
//! `new_*` initializes fresh storage and refuses a name whose metadata slot is
//! already assigned. `get_*` attaches to whatever is stored without writing.

use crate::{
    address::Namespace,
    array::{FixedArray, IndexOutOfRange},
    iterable_map::IterableMap,
    map::Map,
    memory::WordStore,
    slice::Slice,
    state::State,
    value::{TypeDescriptor, Value},
    variable::Variable,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display(fmt = "AlreadyInitialized: {name}")]
pub struct AlreadyInitialized {
    pub name: String,
}

fn checked_values<V: Into<Value>>(
    element: &TypeDescriptor,
    values: impl IntoIterator<Item = V>,
    len: usize,
) -> anyhow::Result<Vec<Value>> {
    let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
    if values.len() > len {
        anyhow::bail!(IndexOutOfRange {
            index: values.len(),
            len,
        })
    }
    for value in &values {
        element.check(value)?
    }
    Ok(values)
}

impl<S: WordStore> State<S> {
    /// Creates `name` typed after `initial` and stores `initial` in it.
    pub fn new_variable(
        &mut self,
        name: impl Into<String>,
        initial: impl Into<Value>,
    ) -> anyhow::Result<Variable> {
        let initial = initial.into();
        let variable = Variable::new(name, initial.descriptor());
        if variable.is_assigned(self) {
            anyhow::bail!(AlreadyInitialized {
                name: variable.name().into(),
            })
        }
        variable.set(self, initial)?;
        Ok(variable)
    }

    pub fn get_variable(&self, name: impl Into<String>, ty: TypeDescriptor) -> Variable {
        Variable::new(name, ty)
    }

    pub fn new_array(
        &mut self,
        name: impl Into<String>,
        len: usize,
        element: TypeDescriptor,
    ) -> anyhow::Result<FixedArray> {
        self.new_array_from(name, len, element, Vec::<Value>::new())
    }

    /// Array of `len` elements whose first elements are `values`; the rest
    /// start unassigned.
    pub fn new_array_from<V: Into<Value>>(
        &mut self,
        name: impl Into<String>,
        len: usize,
        element: TypeDescriptor,
        values: impl IntoIterator<Item = V>,
    ) -> anyhow::Result<FixedArray> {
        let name = name.into();
        if self.get_array(name.clone(), element.clone()).is_allocated(self) {
            anyhow::bail!(AlreadyInitialized { name })
        }
        let values = checked_values(&element, values, len)?;
        let array = FixedArray::allocate(self, Namespace::Array, name, len, element)?;
        for (index, value) in values.into_iter().enumerate() {
            array.set(self, index, value)?
        }
        Ok(array)
    }

    pub fn get_array(&self, name: impl Into<String>, element: TypeDescriptor) -> FixedArray {
        FixedArray::attach(Namespace::Array, name.into(), element)
    }

    pub fn new_slice(
        &mut self,
        name: impl Into<String>,
        len: usize,
        cap: usize,
        element: TypeDescriptor,
    ) -> anyhow::Result<Slice> {
        self.new_slice_from(name, len, cap, element, Vec::<Value>::new())
    }

    pub fn new_slice_from<V: Into<Value>>(
        &mut self,
        name: impl Into<String>,
        len: usize,
        cap: usize,
        element: TypeDescriptor,
        values: impl IntoIterator<Item = V>,
    ) -> anyhow::Result<Slice> {
        let name = name.into();
        if self.get_slice(name.clone(), element.clone()).is_allocated(self) {
            anyhow::bail!(AlreadyInitialized { name })
        }
        let values = checked_values(&element, values, len)?;
        let slice = Slice::allocate(self, Namespace::Slice, name, len, cap, element)?;
        for (index, value) in values.into_iter().enumerate() {
            slice.set(self, index, value)?
        }
        Ok(slice)
    }

    pub fn get_slice(&self, name: impl Into<String>, element: TypeDescriptor) -> Slice {
        Slice::attach(Namespace::Slice, name.into(), element)
    }

    /// Same as [`State::get_map`]: a hashed map keeps no metadata.
    pub fn new_map(
        &mut self,
        name: impl Into<String>,
        key: TypeDescriptor,
        value: TypeDescriptor,
    ) -> Map {
        self.get_map(name, key, value)
    }

    pub fn get_map(
        &self,
        name: impl Into<String>,
        key: TypeDescriptor,
        value: TypeDescriptor,
    ) -> Map {
        Map::attach(Namespace::Map, name.into(), key, value)
    }

    pub fn new_iterable_map(
        &mut self,
        name: impl Into<String>,
        key: TypeDescriptor,
        value: TypeDescriptor,
    ) -> anyhow::Result<IterableMap> {
        let name = name.into();
        if IterableMap::attach(name.clone(), key.clone(), value.clone()).is_allocated(self) {
            anyhow::bail!(AlreadyInitialized { name })
        }
        IterableMap::allocate(self, name, key, value)
    }

    pub fn get_iterable_map(
        &self,
        name: impl Into<String>,
        key: TypeDescriptor,
        value: TypeDescriptor,
    ) -> IterableMap {
        IterableMap::attach(name.into(), key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        memory::MemoryStore,
        value::{
            tests::{bob, Person},
            StateValue, TypeMismatch,
        },
    };

    fn state() -> State<MemoryStore> {
        State::new(MemoryStore::new())
    }

    fn already_initialized(result: anyhow::Result<impl std::fmt::Debug>) -> bool {
        result
            .unwrap_err()
            .downcast_ref::<AlreadyInitialized>()
            .is_some()
    }

    #[test]
    fn variable_new_then_get() {
        let mut state = state();
        let variable = state.new_variable("owner", bob().into_value()).unwrap();
        assert_eq!(variable.ty(), &Person::descriptor());

        let attached = state.get_variable("owner", Person::descriptor());
        let mut out = Person::default();
        assert!(attached.get_into(&state, &mut out).unwrap());
        assert_eq!(out, bob());

        assert!(already_initialized(state.new_variable("owner", bob().into_value())));
    }

    #[test]
    fn get_does_not_write() {
        let state = state();
        let variable = state.get_variable("nothing", TypeDescriptor::U64);
        let array = state.get_array("nothing", TypeDescriptor::U64);
        let slice = state.get_slice("nothing", TypeDescriptor::U64);
        let map = state.get_iterable_map("nothing", TypeDescriptor::U64, TypeDescriptor::U64);
        assert!(!variable.is_assigned(&state));
        assert_eq!(array.len(&state), 0);
        assert_eq!(slice.len(&state), 0);
        assert_eq!(slice.cap(&state), 0);
        assert!(map.is_empty(&state));
        assert!(state.store().is_empty());
    }

    #[test]
    fn array_from_values() {
        let mut state = state();
        let array = state
            .new_array_from("words", 4, TypeDescriptor::String, ["1", "2", "3"])
            .unwrap();
        assert_eq!(array.len(&state), 4);
        assert_eq!(array.get(&state, 2).unwrap(), Value::from("3"));
        assert_eq!(array.load(&state, 3).unwrap(), None);

        let attached = state.get_array("words", TypeDescriptor::String);
        assert_eq!(attached.get(&state, 0).unwrap(), Value::from("1"));
        assert!(already_initialized(state.new_array("words", 1, TypeDescriptor::String)));
    }

    #[test]
    fn too_many_initial_values() {
        let mut state = state();
        let err = state
            .new_array_from("short", 1, TypeDescriptor::U8, [1u8, 2])
            .unwrap_err();
        assert!(err.downcast_ref::<IndexOutOfRange>().is_some());
        let err = state
            .new_slice_from("short", 1, 4, TypeDescriptor::U8, [1u8, 2])
            .unwrap_err();
        assert!(err.downcast_ref::<IndexOutOfRange>().is_some());
        assert!(state.store().is_empty());
    }

    #[test]
    fn initial_values_are_type_checked() {
        let mut state = state();
        let err = state
            .new_array_from("mixed", 2, TypeDescriptor::U8, [Value::U8(1), Value::from("2")])
            .unwrap_err();
        assert!(err.downcast_ref::<TypeMismatch>().is_some());
        assert!(state.store().is_empty());
    }

    #[test]
    fn slice_from_values() {
        let mut state = state();
        let slice = state
            .new_slice_from("greeting", 2, 3, TypeDescriptor::String, ["Hello", "World"])
            .unwrap();
        assert_eq!(slice.len(&state), 2);
        assert_eq!(slice.cap(&state), 3);
        slice.append(&mut state, ["!"]).unwrap();

        let attached = state.get_slice("greeting", TypeDescriptor::String);
        assert_eq!(attached.len(&state), 3);
        assert_eq!(attached.get(&state, 2).unwrap(), Value::from("!"));
        assert!(already_initialized(state.new_slice(
            "greeting",
            0,
            1,
            TypeDescriptor::String
        )));
    }

    #[test]
    fn slice_and_array_names_do_not_collide() {
        let mut state = state();
        state.new_array("shared", 2, TypeDescriptor::U8).unwrap();
        let slice = state.new_slice("shared", 1, 2, TypeDescriptor::U8).unwrap();
        assert_eq!(slice.len(&state), 1);
        assert_eq!(state.get_array("shared", TypeDescriptor::U8).len(&state), 2);
    }

    #[test]
    fn maps_new_and_get() {
        let mut state = state();
        let map = state.new_map("ages", TypeDescriptor::String, TypeDescriptor::U8);
        map.set(&mut state, "bob", 12u8).unwrap();
        let again = state.new_map("ages", TypeDescriptor::String, TypeDescriptor::U8);
        assert_eq!(again.get(&state, "bob").unwrap(), Some(Value::U8(12)));

        let iterable = state
            .new_iterable_map("ages", TypeDescriptor::String, TypeDescriptor::U8)
            .unwrap();
        iterable.set(&mut state, "alice", 16u8).unwrap();
        // iterable maps live in their own namespace
        assert!(!iterable.contains(&state, "bob").unwrap());
        let attached =
            state.get_iterable_map("ages", TypeDescriptor::String, TypeDescriptor::U8);
        assert_eq!(
            attached.entries(&state).unwrap(),
            [(Value::from("alice"), Value::U8(16))]
        );
        assert!(already_initialized(state.new_iterable_map(
            "ages",
            TypeDescriptor::String,
            TypeDescriptor::U8
        )));
    }
}
