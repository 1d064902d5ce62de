use statevar::{render, MemoryStore, Record, State, TypeDescriptor};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let mut state = State::new(MemoryStore::new());

    let person = "Person { name: string, age: u8, location: Location { x: i64, y: i64, z: i64 } }"
        .parse::<TypeDescriptor>()?;
    let location = Record::new("Location")
        .with("x", 1i64)
        .with("y", 2i64)
        .with("z", 3i64);
    let bob = Record::new("Person")
        .with("name", "Bob")
        .with("age", 12u8)
        .with("location", location);
    let owner = state.new_variable("owner", bob.clone())?;
    tracing::info!("{}", render::variable(&state, &owner));

    let words = state.new_array_from("words", 4, TypeDescriptor::String, ["1", "2", "3"])?;
    words.delete(&mut state, 0)?;
    tracing::info!("{}", render::array(&state, &words)?);

    let greeting = state.new_slice_from(
        "greeting",
        2,
        3,
        TypeDescriptor::String,
        ["Hello", "World"],
    )?;
    greeting.append(&mut state, ["I'm", "the", "star", "of", "the"])?;
    tracing::info!("{}", render::slice(&state, &greeting)?);

    let people = state.new_iterable_map("people", TypeDescriptor::String, person)?;
    people.set(&mut state, "bob", bob)?;
    tracing::info!("{}", render::iterable_map(&state, &people)?);

    tracing::info!("{} words in store", state.store().len());
    Ok(())
}
