//! The finder facade.
//!
//! [`Finder`] owns a metadata provider, the resolution cache, a diagnostic
//! sink and the configuration. It exposes two ways of asking for members:
//!
//! - [`Finder::find`] (query mode) returns a [`FindResult`] the caller
//!   reads members and invocation handles from
//! - [`Finder::process`] (bind mode) additionally writes the outcome into
//!   a caller-owned [`BindTarget`]
//!
//! # Failure Reporting
//!
//! A failed primary resolution is reported once, when its outcome is
//! dropped. Until then the caller may attach a remedy plan or call
//! `ignored()`, either of which suppresses the report. Remedy plans report
//! their own attempts.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};

use crate::cache::ResolutionCache;
use crate::config::FinderConfig;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, FailureContext, TracingSink};
use crate::instance::InstanceHandle;
use crate::matcher::Matcher;
use crate::provider::MetadataProvider;
use crate::remedy::{RemedyPlan, RemedyReport};
use crate::result::{ResolutionResult, ResolveError};
use crate::rules::RuleSet;
use crate::types::{CandidateMember, TypeRef, Value};

/// A caller-owned member list that bind mode writes into.
pub trait BindTarget {
    /// Replace the whole content of the target.
    fn replace(&self, members: Vec<CandidateMember>);
}

impl BindTarget for Mutex<Vec<CandidateMember>> {
    fn replace(&self, members: Vec<CandidateMember>) {
        *self.lock() = members;
    }
}

impl BindTarget for RwLock<Vec<CandidateMember>> {
    fn replace(&self, members: Vec<CandidateMember>) {
        *self.write() = members;
    }
}

/// Replace `target` with the primary result. A failed result clears it.
pub fn bind_primary<T: BindTarget + ?Sized>(target: &T, result: &ResolutionResult) {
    target.replace(result.primary().cloned().into_iter().collect());
}

/// Replace `target` with every matched member.
pub fn bind_all<T: BindTarget + ?Sized>(target: &T, result: &ResolutionResult) {
    target.replace(result.all().iter().cloned().collect());
}

/// Resolves rule sets against a provider, with caching and diagnostics.
pub struct Finder<P> {
    provider: P,
    cache: ResolutionCache,
    sink: Arc<dyn DiagnosticSink>,
    config: FinderConfig,
}

impl<P: MetadataProvider> Finder<P> {
    /// Create a finder with the default configuration, reporting through
    /// `tracing`.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: ResolutionCache::new(),
            sink: Arc::new(TracingSink),
            config: FinderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FinderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve `rules` against `ty`.
    ///
    /// With caching enabled, the first call for a (type, rule set) pair
    /// computes the result and every later call shares it.
    pub fn resolve(&self, ty: &TypeRef, rules: &RuleSet) -> Arc<ResolutionResult> {
        let matcher = Matcher::new(&self.provider);
        if !self.config.cache_enabled {
            return Arc::new(matcher.resolve(ty, rules));
        }
        self.cache.get_or_resolve(ty, rules, || matcher.resolve(ty, rules))
    }

    /// Resolve and report every found member with the elapsed time.
    pub(crate) fn resolve_reported(&self, ty: &TypeRef, rules: &RuleSet) -> Arc<ResolutionResult> {
        let start = Instant::now();
        let result = self.resolve(ty, rules);
        let elapsed = start.elapsed();

        if self.config.report_found_members {
            for member in result.all() {
                self.emit(DiagnosticEvent::MemberFound {
                    tag: self.config.tag.clone(),
                    member: member.clone(),
                    elapsed,
                });
            }
        }
        result
    }

    /// Query mode.
    pub fn find(&self, ty: &TypeRef, rules: &RuleSet) -> FindResult<'_, P> {
        let result = self.resolve_reported(ty, rules);
        let primary_failure = result.failure().cloned();
        FindResult {
            finder: self,
            ty: ty.clone(),
            rules: rules.clone(),
            failure_pending: primary_failure.is_some(),
            primary_failure,
            result,
            remedy: None,
        }
    }

    /// Bind mode: resolve, then replace `target` with the primary result.
    pub fn process<'t, T: BindTarget + ?Sized>(
        &self,
        ty: &TypeRef,
        rules: &RuleSet,
        target: &'t T,
    ) -> Process<'_, 't, P, T> {
        let inner = self.find(ty, rules);
        bind_primary(target, inner.result());
        Process {
            inner,
            target,
            bind_all: false,
        }
    }

    /// Hand an event to the sink.
    pub fn emit(&self, event: DiagnosticEvent) {
        self.sink.emit(event);
    }
}

impl<P: fmt::Debug> fmt::Debug for Finder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finder")
            .field("provider", &self.provider)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

/// Outcome of a query-mode resolution.
pub struct FindResult<'f, P: MetadataProvider> {
    finder: &'f Finder<P>,
    ty: TypeRef,
    rules: RuleSet,
    result: Arc<ResolutionResult>,
    primary_failure: Option<ResolveError>,
    failure_pending: bool,
    remedy: Option<RemedyReport>,
}

impl<'f, P: MetadataProvider> FindResult<'f, P> {
    /// Whether a member is available, from the primary resolution or a
    /// remedy.
    pub fn found(&self) -> bool {
        self.result.found()
    }

    /// The current result: the remedy's if one succeeded.
    pub fn result(&self) -> &ResolutionResult {
        &self.result
    }

    /// Why the primary resolution failed.
    pub fn failure(&self) -> Option<&ResolveError> {
        self.primary_failure.as_ref()
    }

    /// The primary member.
    pub fn give(&self) -> Option<&CandidateMember> {
        self.result.primary()
    }

    /// Every matched member.
    pub fn give_all(&self) -> &IndexSet<CandidateMember> {
        self.result.all()
    }

    /// Handle to the primary member on `instance`.
    pub fn get(&self, instance: Option<Value>) -> InstanceHandle<'f, P> {
        InstanceHandle::new(&self.finder.provider, self.give().cloned(), instance)
    }

    /// Handles to every matched member on `instance`.
    pub fn all(&self, instance: Option<Value>) -> Vec<InstanceHandle<'f, P>> {
        self.give_all()
            .iter()
            .map(|member| {
                InstanceHandle::new(&self.finder.provider, Some(member.clone()), instance.clone())
            })
            .collect()
    }

    /// Attach a remedy plan.
    ///
    /// The plan is built and run only if the primary resolution failed. On
    /// success the remedy's result replaces the current one.
    pub fn remedies<'cb>(mut self, initiate: impl FnOnce(&mut RemedyPlan<'cb>)) -> Self {
        self.failure_pending = false;
        if self.primary_failure.is_none() {
            return self;
        }

        let mut plan = RemedyPlan::new();
        initiate(&mut plan);
        let report = plan.run(self.finder, &self.ty);
        if let Some(result) = &report.result {
            self.result = Arc::clone(result);
        }
        self.remedy = Some(report);
        self
    }

    /// Called with the primary failure cause, if there is one.
    pub fn on_no_such_member(self, callback: impl FnOnce(&ResolveError)) -> Self {
        if let Some(cause) = &self.primary_failure {
            callback(cause);
        }
        self
    }

    /// Suppress the primary failure report.
    pub fn ignored(mut self) -> Self {
        self.failure_pending = false;
        self
    }

    /// Outcome of the attached remedy plan, if one ran.
    pub fn remedy_report(&self) -> Option<&RemedyReport> {
        self.remedy.as_ref()
    }
}

impl<P: MetadataProvider> Drop for FindResult<'_, P> {
    fn drop(&mut self) {
        if !self.failure_pending || !self.finder.config.report_failures {
            return;
        }
        if let Some(cause) = self.primary_failure.take() {
            self.finder.emit(DiagnosticEvent::ResolutionFailed {
                tag: self.finder.config.tag.clone(),
                cause,
                context: FailureContext {
                    ty: self.ty.clone(),
                    rules: self.rules.to_string(),
                },
            });
        }
    }
}

impl<P: MetadataProvider> fmt::Debug for FindResult<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindResult")
            .field("ty", &self.ty)
            .field("rules", &self.rules)
            .field("result", &self.result)
            .field("remedy", &self.remedy)
            .finish()
    }
}

/// Outcome of a bind-mode resolution.
pub struct Process<'f, 't, P: MetadataProvider, T: ?Sized> {
    inner: FindResult<'f, P>,
    target: &'t T,
    bind_all: bool,
}

impl<'f, 't, P: MetadataProvider, T: BindTarget + ?Sized> Process<'f, 't, P, T> {
    pub fn found(&self) -> bool {
        self.inner.found()
    }

    pub fn result(&self) -> &ResolutionResult {
        self.inner.result()
    }

    pub fn failure(&self) -> Option<&ResolveError> {
        self.inner.failure()
    }

    /// Bind every matched member instead of only the primary one.
    pub fn all(mut self) -> Self {
        self.bind_all = true;
        if self.inner.found() {
            bind_all(self.target, self.inner.result());
        }
        self
    }

    /// Attach a remedy plan. A successful remedy is bound in the current
    /// mode.
    pub fn remedies<'cb>(mut self, initiate: impl FnOnce(&mut RemedyPlan<'cb>)) -> Self {
        self.inner = self.inner.remedies(initiate);
        if self.inner.remedy_report().is_some_and(RemedyReport::succeeded) {
            self.bind();
        }
        self
    }

    pub fn on_no_such_member(mut self, callback: impl FnOnce(&ResolveError)) -> Self {
        self.inner = self.inner.on_no_such_member(callback);
        self
    }

    pub fn ignored(mut self) -> Self {
        self.inner = self.inner.ignored();
        self
    }

    pub fn remedy_report(&self) -> Option<&RemedyReport> {
        self.inner.remedy_report()
    }

    fn bind(&self) {
        if self.bind_all {
            bind_all(self.target, self.inner.result());
        } else {
            bind_primary(self.target, self.inner.result());
        }
    }
}

impl<P: MetadataProvider, T: ?Sized> fmt::Debug for Process<'_, '_, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("inner", &self.inner)
            .field("bind_all", &self.bind_all)
            .finish()
    }
}
