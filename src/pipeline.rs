// src/pipeline.rs
//! Sequential chain of fallible steps.
//!
//! Each [`Pipeline::step`] consumes the previous value and yields the next, so
//! the type flowing between steps is checked at compile time. The first failing
//! step ends the chain: no later step runs and its error becomes the result.
//! Nothing is rolled back, so callers put irreversible writes after the checks.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::AppError;

pub struct Pipeline<T> {
    name: &'static str,
    value: Result<T, AppError>,
    completed: usize,
}

impl<T> Pipeline<T> {
    pub fn start(name: &'static str, initial: T) -> Self {
        Self {
            name,
            value: Ok(initial),
            completed: 0,
        }
    }

    pub async fn step<U, F, Fut>(self, step: &'static str, f: F) -> Pipeline<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<U, AppError>>,
    {
        let Pipeline {
            name,
            value,
            completed,
        } = self;

        let value = match value {
            Ok(input) => {
                debug!(pipeline = name, step, "running step");
                let output = f(input).await;
                if let Err(err) = &output {
                    warn!(pipeline = name, step, error = %err, "step failed");
                }
                output
            }
            Err(err) => Err(err),
        };

        let completed = if value.is_ok() { completed + 1 } else { completed };

        Pipeline {
            name,
            value,
            completed,
        }
    }

    /// Steps that finished successfully so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn finish(self) -> Result<T, AppError> {
        self.value
    }
}

/// Run `initial` through same-typed steps in order, stopping at the first failure.
pub async fn process<T, F, Fut>(name: &'static str, initial: T, steps: Vec<F>) -> Result<T, AppError>
where
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut pipeline = Pipeline::start(name, initial);
    for f in steps {
        pipeline = pipeline.step("step", f).await;
    }
    pipeline.finish()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn runs_every_step_in_order() {
        let result = Pipeline::start("test", 2)
            .step("double", |v| async move { Ok(v * 2) })
            .await
            .step("stringify", |v: i32| async move { Ok(format!("value {v}")) })
            .await
            .finish();

        assert_eq!(result.unwrap(), "value 4");
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let pipeline = Pipeline::start("test", 1)
            .step("first", |v| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            })
            .await
            .step("second", |_v: i32| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(AppError::Conflict("Nothing good happens after 2:00 PM".into()))
            })
            .await
            .step("third", |v| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(v + 1)
            })
            .await
            .step("fourth", |v| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(v + 1)
            })
            .await;

        assert_eq!(pipeline.completed(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        let err = pipeline.finish().unwrap_err();
        assert_eq!(err.to_string(), "Nothing good happens after 2:00 PM");
    }

    #[tokio::test]
    async fn process_short_circuits() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let counted = move |fail: bool| {
            move |v: i32| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(AppError::InvalidInput("boom".into()))
                } else {
                    Ok(v + 1)
                }
            }
        };

        let result = process("test", 0, vec![counted(false), counted(true), counted(false)]).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(matches!(result, Err(AppError::InvalidInput(ref m)) if m == "boom"));
    }

    #[tokio::test]
    async fn process_returns_last_value() {
        let add = |n: i32| move |v: i32| async move { Ok(v + n) };

        let result = process("test", 1, vec![add(1), add(10), add(100)]).await;

        assert_eq!(result.unwrap(), 112);
    }
}
