//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use bodi::{Arguments, Component, ComponentBuilder, Constructor, Parameter};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}
bodi::interface!(dyn Clock);

pub trait Ticker: Send + Sync {
    fn ticks(&self) -> u64;
}
bodi::interface!(dyn Ticker);

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        1_000
    }
}

impl Ticker for SystemClock {
    fn ticks(&self) -> u64 {
        7
    }
}

impl Component for SystemClock {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([], |_| Ok(SystemClock)))
            .implements::<dyn Clock>(|clock| clock)
            .implements::<dyn Ticker>(|clock| clock);
    }
}

pub struct FrozenClock(pub u64);

impl Clock for FrozenClock {
    fn now(&self) -> u64 {
        self.0
    }
}

impl Component for FrozenClock {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([], |_| Ok(FrozenClock(0))))
            .implements::<dyn Clock>(|clock| clock);
    }

    fn render(&self) -> String {
        format!("FrozenClock({})", self.0)
    }
}

pub struct Scheduler {
    pub clock: Arc<dyn Clock>,
}

impl Component for Scheduler {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([Parameter::service::<dyn Clock>()], |args: &Arguments| {
            Ok(Scheduler {
                clock: args.service::<dyn Clock>(0)?,
            })
        }));
    }
}
