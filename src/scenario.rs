//! Data-driven litmus scenario descriptors.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

use smallvec::SmallVec;

use crate::concurrency::gate::RequireFlag;

/// One worker's part of a litmus test, run once per round.
pub type Body = Box<dyn Fn(&RequireFlag) + Send + Sync>;

/// Runs once per round after all bodies finished. Verifies the round and resets the
/// shared state to its initial configuration.
pub type Checker = Box<dyn Fn(&RequireFlag) + Send + Sync>;

/// Labels a litmus section in the generated assembly.
///
/// Expands to an assembler comment `marker <label>`, which emits no instruction but
/// is opaque to the compiler: memory accesses are not moved across it. This is a
/// compiler-only barrier and never a hardware fence. Targets without stable inline
/// assembly get a `compiler_fence` instead.
#[macro_export]
macro_rules! marker {
    ($label:literal) => {{
        #[cfg(any(
            target_arch = "x86",
            target_arch = "x86_64",
            target_arch = "arm",
            target_arch = "aarch64",
            target_arch = "riscv32",
            target_arch = "riscv64",
            target_arch = "loongarch64",
        ))]
        // SAFETY: the template is a comment; no instruction is emitted.
        unsafe {
            ::core::arch::asm!(concat!("/* marker ", $label, " */"), options(nostack, preserves_flags));
        }
        #[cfg(not(any(
            target_arch = "x86",
            target_arch = "x86_64",
            target_arch = "arm",
            target_arch = "aarch64",
            target_arch = "riscv32",
            target_arch = "riscv64",
            target_arch = "loongarch64",
        )))]
        ::core::sync::atomic::compiler_fence(::core::sync::atomic::Ordering::SeqCst);
    }};
}

/// Stands in for a plain, non-atomic `int`.
///
/// Loads and stores are `Relaxed` and there is deliberately no read-modify-write, so
/// [`increment`](Self::increment) is a separate load and store and can lose updates
/// just like `x++` on an ordinary variable. Unlike an ordinary variable, racing on it
/// is not undefined behavior.
#[derive(Debug, Default)]
pub struct Plain(AtomicI32);

impl Plain {
    pub const fn new(value: i32) -> Self {
        Self(AtomicI32::new(value))
    }

    #[inline]
    pub fn get(&self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, value: i32) {
        self.0.store(value, Ordering::Relaxed)
    }

    #[inline]
    pub fn increment(&self) {
        self.set(self.get() + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    /// A scenario needs at least one worker body.
    NoBodies { name: String },
    /// Every body gets its own thread, so fewer cores than bodies cannot work.
    ConcurrencyBelowBodyCount { name: String, required: usize, bodies: usize },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::NoBodies { name } => write!(f, "scenario `{name}` has no worker bodies"),
            ScenarioError::ConcurrencyBelowBodyCount { name, required, bodies } =>
                write!(
                    f,
                    "scenario `{name}` requires {required} cores but runs {bodies} worker bodies"
                ),
        }
    }
}

impl std::error::Error for ScenarioError {}

/// A named litmus test: worker bodies over shared state, plus the per-round checker.
///
/// The shared state lives in whatever the closures capture, typically an `Arc`.
pub struct Scenario {
    name: String,
    required_concurrency: usize,
    bodies: SmallVec<[Body; 4]>,
    checker: Checker,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("required_concurrency", &self.required_concurrency)
            .field("bodies", &self.bodies.len())
            .finish_non_exhaustive()
    }
}

impl Scenario {
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            name: name.into(),
            required_concurrency: None,
            bodies: SmallVec::new(),
            checker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of cores this scenario must be given to run at all.
    pub fn required_concurrency(&self) -> usize {
        self.required_concurrency
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }
}

#[must_use]
pub struct ScenarioBuilder {
    name: String,
    required_concurrency: Option<usize>,
    bodies: SmallVec<[Body; 4]>,
    checker: Option<Checker>,
}

impl ScenarioBuilder {
    /// Adds a worker body. Bodies keep their order; body `i` runs on worker `i`.
    pub fn body(mut self, body: impl Fn(&RequireFlag) + Send + Sync + 'static) -> Self {
        self.bodies.push(Box::new(body));
        self
    }

    pub fn checker(mut self, checker: impl Fn(&RequireFlag) + Send + Sync + 'static) -> Self {
        self.checker = Some(Box::new(checker));
        self
    }

    /// Overrides the required concurrency, which defaults to the number of bodies.
    pub fn required_concurrency(mut self, cores: usize) -> Self {
        self.required_concurrency = Some(cores);
        self
    }

    pub fn build(self) -> Result<Scenario, ScenarioError> {
        if self.bodies.is_empty() {
            return Err(ScenarioError::NoBodies { name: self.name });
        }
        let required = self.required_concurrency.unwrap_or(self.bodies.len());
        if required < self.bodies.len() {
            return Err(ScenarioError::ConcurrencyBelowBodyCount {
                name: self.name,
                required,
                bodies: self.bodies.len(),
            });
        }
        Ok(Scenario {
            name: self.name,
            required_concurrency: required,
            bodies: self.bodies,
            checker: self.checker.unwrap_or_else(|| Box::new(|_: &RequireFlag| {})),
        })
    }
}
