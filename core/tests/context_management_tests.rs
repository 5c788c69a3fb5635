// tests/context_management_tests.rs
mod common;

use common::*;
use grocer::ContextData;

#[test]
fn test_clones_share_the_same_data() {
  let ctx = ContextData::new(TestContext::default());
  let other = ctx.clone();
  other.update(|data| data.counter = 7);
  assert_eq!(ctx.with(|data| data.counter), 7);
}

#[test]
fn test_update_returns_closure_result() {
  let ctx = ContextData::new(TestContext::default());
  let len = ctx.update(|data| {
    data.message.push_str("hello");
    data.message.len()
  });
  assert_eq!(len, 5);
  assert_eq!(ctx.read().message, "hello");
}

#[test]
fn test_try_unwrap_needs_the_last_handle() {
  let ctx = ContextData::new(TestContext {
    counter: 3,
    ..Default::default()
  });
  let extra = ctx.clone();
  let ctx = ctx.try_unwrap().expect_err("a second handle is still alive");
  drop(extra);
  let data = ctx.try_unwrap().expect("last handle");
  assert_eq!(data.counter, 3);
}

#[test]
fn test_debug_does_not_deadlock_while_write_locked() {
  let ctx = ContextData::new(TestContext::default());
  let guard = ctx.write();
  assert_eq!(format!("{:?}", ctx), "ContextData(<locked>)");
  drop(guard);
  assert!(format!("{:?}", ctx).contains("counter: 0"));
}
