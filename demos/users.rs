//! Example: Querying a slow store sequentially, then concurrently
//!
//! Every store call takes one second. Run one after another they take four
//! seconds; run through futures they overlap and finish in about one.
//!
//! Run with `RUST_LOG=eventual=trace` to see the background tasks.

use eventual::{Builder, CancelError, CancellationToken};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct User {
    name: String,
    age: u32,
    location: String,
}

#[derive(Debug, Clone, PartialEq)]
enum StoreError {
    ReadOnly,
    Cancelled(CancelError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ReadOnly => f.write_str("could not set name"),
            StoreError::Cancelled(reason) => write!(f, "gave up waiting: {reason}"),
        }
    }
}

impl From<CancelError> for StoreError {
    fn from(reason: CancelError) -> Self {
        StoreError::Cancelled(reason)
    }
}

#[derive(Clone)]
struct UserStore {
    user: User,
    latency: Duration,
}

impl UserStore {
    fn get_user(&self) -> Result<User, StoreError> {
        thread::sleep(self.latency);
        Ok(self.user.clone())
    }

    fn get_location(&self) -> String {
        thread::sleep(self.latency);
        self.user.location.clone()
    }

    fn get_name_and_age(&self) -> Result<(String, u32), StoreError> {
        thread::sleep(self.latency);
        Ok((self.user.name.clone(), self.user.age))
    }

    fn set_name(&self, _name: &str) -> Result<(), StoreError> {
        thread::sleep(self.latency);
        Err(StoreError::ReadOnly)
    }
}

fn sequential(store: &UserStore) {
    let start = Instant::now();

    let user = store.get_user();
    let name_and_age = store.get_name_and_age();
    let location = store.get_location();
    let set = store.set_name("Another Name");

    println!("sequential ({:?}):", start.elapsed());
    println!("  user = {user:?}");
    println!("  name and age = {name_and_age:?}");
    println!("  location = {location}");
    println!("  set name = {set:?}");
}

fn concurrent(store: &UserStore) {
    let start = Instant::now();

    let s = store.clone();
    let user = eventual::result(move || s.get_user());

    let s = store.clone();
    let name_and_age = eventual::pair(move || s.get_name_and_age());

    let s = store.clone();
    let location = Builder::new()
        .name("location")
        .spawn(move || s.get_location())
        .expect("spawn location lookup");

    let s = store.clone();
    let set = eventual::err(move || s.set_name("Another Name"));

    let user = user.get();
    let name_and_age = name_and_age.get();
    let location = location.wait();

    // This one could be abandoned by cancelling the token.
    let token = CancellationToken::with_timeout(Duration::from_secs(5));
    let set = set.get_with(&token);

    println!("concurrent ({:?}):", start.elapsed());
    println!("  user = {user:?}");
    println!("  name and age = {name_and_age:?}");
    println!("  location = {location}");
    match set {
        Ok(()) => println!("  set name = ok"),
        Err(e) => println!("  set name = {e}"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = UserStore {
        user: User {
            name: String::from("Full Name"),
            age: 100,
            location: String::from("Mars"),
        },
        latency: Duration::from_secs(1),
    };

    sequential(&store);
    concurrent(&store);
}
