use crate::cache::{BusResolver, CacheStore};
use crate::command::CommandRunner;
use crate::detect::Prober;
use crate::error::Result;
use crate::mode::{self, GraphicsMode};
use crate::root::SystemRoot;
use crate::switch::{ModeController, ResetReport, SwitchOptions, SwitchReport};

/// One mutating invocation. The current mode is read once on entry and
/// decides where the Nvidia bus ID comes from for the whole operation.
pub struct Session<'a> {
    root: SystemRoot,
    runner: &'a dyn CommandRunner,
    cache: CacheStore,
    current: GraphicsMode,
    resolver: BusResolver,
}

impl<'a> Session<'a> {
    /// Inspect the current mode and pick the bus ID resolver. In hybrid mode
    /// this refreshes the cache from a live probe.
    pub fn begin(root: SystemRoot, runner: &'a dyn CommandRunner) -> Result<Self> {
        let current = mode::current_mode(&root);
        let cache = CacheStore::new(root.clone());
        let resolver = BusResolver::for_operation(current, &cache, &Prober::new(&root, runner))?;
        log::debug!("Current mode {}, bus resolver {:?}", current, resolver);

        Ok(Self {
            root,
            runner,
            cache,
            current,
            resolver,
        })
    }

    pub fn current_mode(&self) -> GraphicsMode {
        self.current
    }

    pub fn resolver(&self) -> &BusResolver {
        &self.resolver
    }

    fn controller(&self) -> ModeController<'a> {
        ModeController::new(self.root.clone(), self.runner)
    }

    pub fn switch(&self, target: GraphicsMode, opts: &SwitchOptions) -> Result<SwitchReport> {
        self.controller().switch(target, opts, &self.resolver)
    }

    pub fn reset(&self) -> ResetReport {
        self.controller().reset(&self.cache)
    }

    pub fn reset_sddm(&self) -> Result<()> {
        self.controller().reset_sddm()
    }
}
