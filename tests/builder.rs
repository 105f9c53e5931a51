use eventual::Builder;
use std::thread;

#[test]
fn test_builder_names_thread() {
    let future = Builder::new()
        .name("db-user")
        .spawn(|| thread::current().name().map(str::to_owned))
        .unwrap();

    assert_eq!(future.wait().as_deref(), Some("db-user"));
}

#[test]
fn test_builder_default_is_unnamed() {
    let future = Builder::default()
        .spawn(|| thread::current().name().map(str::to_owned))
        .unwrap();

    assert_eq!(*future.wait(), None);
}

#[test]
fn test_builder_stack_size() {
    let future = Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(|| {
            let buffer = [7_u8; 1024 * 1024];
            buffer.iter().map(|&b| b as u64).sum::<u64>()
        })
        .unwrap();

    assert_eq!(*future.wait(), 7 * 1024 * 1024);
}

#[test]
#[should_panic(expected = "stack_size must be > 0")]
fn test_builder_rejects_zero_stack() {
    let _ = Builder::new().stack_size(0);
}
