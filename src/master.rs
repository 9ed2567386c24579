//! The global search coordinator.
//!
//! The master owns everything that outlives a single node: the
//! optimization sense and tolerances, the parameter table, the global
//! primal and dual bounds with their monotonicity guarantees, the
//! constraint/variable/cut pools, the open-node frontier, the candidates
//! for fixing by reduced cost, the solution history, and the enumeration
//! tree itself. `optimize` runs the whole branch-and-cut search:
//! materialize the root, then select and process nodes until the
//! frontier is empty or a resource limit trips.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::time::Instant;

use crate::active::ActiveSet;
use crate::callback::{Callback, NoOpCallback, OutputLevel, SearchEvent};
use crate::convar::{ConRc, Constraint, VarRc, Variable};
use crate::error::{Error, ErrorKind, Result};
use crate::fixcand::FixCand;
use crate::history::History;
use crate::lp::{DenseSimplex, LpSolver};
use crate::model::Model;
use crate::opensub::{EnumStrategy, OpenSubs};
use crate::params::Parameters;
use crate::pool::{NonDuplPool, PoolSlotRef, StandardPool};
use crate::sub::{Sub, SubStatus};
use crate::terminators::{MultipleTerminators, Terminator};
use crate::treelog::{TreeLog, VbcMode};
use crate::varstat::FsVarStat;
use crate::{E, I, Sense, Status, Tol};

/// The strategy selecting the branching variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingStrategy {
    /// The fractional variable closest to one half.
    CloseHalf,
    /// Closest to one half; ties prefer the larger objective
    /// coefficient.
    #[default]
    CloseHalfExpensive,
}

impl BranchingStrategy {
    pub const NAMES: [&'static str; 2] = ["CloseHalf", "CloseHalfExpensive"];
}

/// What the cutting skip factor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkippingMode {
    #[default]
    SkipByNode,
    SkipByLevel,
}

impl SkippingMode {
    pub const NAMES: [&'static str; 2] = ["SkipByNode", "SkipByLevel"];
}

/// How the primal bound is initialized from the optimum file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimalBoundMode {
    #[default]
    None,
    Optimum,
    OptimumOne,
}

impl PrimalBoundMode {
    pub const NAMES: [&'static str; 3] = ["None", "Optimum", "OptimumOne"];
}

/// When active constraints are eliminated from the node LP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConElimMode {
    None,
    NonBinding,
    #[default]
    Basic,
}

impl ConElimMode {
    pub const NAMES: [&'static str; 3] = ["None", "NonBinding", "Basic"];
}

/// When active variables are eliminated from the node LP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarElimMode {
    None,
    #[default]
    ReducedCost,
}

impl VarElimMode {
    pub const NAMES: [&'static str; 2] = ["None", "ReducedCost"];
}

/// The parsed settings of the search, validated from the parameter
/// table at the start of every optimization.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub enumeration_strategy: EnumStrategy,
    pub branching_strategy: BranchingStrategy,
    pub n_branching_candidates: I,
    pub n_strong_branching_iterations: I,
    pub required_guarantee: E,
    pub max_level: I,
    pub max_n_sub: I,
    pub max_cpu_secs: u64,
    pub max_cow_secs: u64,
    pub obj_integer: bool,
    pub tailoff_n_lps: I,
    pub tailoff_percent: E,
    pub db_threshold: I,
    pub min_dormant_rounds: I,
    pub output_level: OutputLevel,
    pub log_level: OutputLevel,
    pub pb_mode: PrimalBoundMode,
    pub pricing_freq: I,
    pub skip_factor: I,
    pub skipping_mode: SkippingMode,
    pub fix_set_by_red_cost: bool,
    pub print_lp: bool,
    pub max_con_add: I,
    pub max_con_buffered: I,
    pub max_var_add: I,
    pub max_var_buffered: I,
    pub max_iterations: i64,
    pub eliminate_fixed_set: bool,
    pub new_root_reoptimize: bool,
    pub optimum_file: Option<String>,
    pub show_average_cut_distance: bool,
    pub con_elim_mode: ConElimMode,
    pub con_elim_eps: E,
    pub con_elim_age: I,
    pub var_elim_mode: VarElimMode,
    pub var_elim_eps: E,
    pub var_elim_age: I,
    pub vbc_mode: VbcMode,
    pub default_lp_solver: String,
    pub solve_approx: bool,
}

fn output_level_from(index: I) -> OutputLevel {
    match index {
        0 => OutputLevel::Silent,
        1 => OutputLevel::Statistics,
        2 => OutputLevel::Subproblem,
        3 => OutputLevel::LinearProgram,
        _ => OutputLevel::Full,
    }
}

impl Config {
    pub(crate) fn from_params(params: &Parameters, tol: Tol) -> Result<Self> {
        let enumeration_strategy = match params.find("EnumerationStrategy", &EnumStrategy::NAMES)? {
            0 => EnumStrategy::BestFirst,
            1 => EnumStrategy::BreadthFirst,
            2 => EnumStrategy::DepthFirst,
            _ => EnumStrategy::DiveAndBest,
        };
        let branching_strategy = match params.find("BranchingStrategy", &BranchingStrategy::NAMES)?
        {
            0 => BranchingStrategy::CloseHalf,
            _ => BranchingStrategy::CloseHalfExpensive,
        };
        let pb_mode = match params.find("PrimalBoundInitMode", &PrimalBoundMode::NAMES)? {
            0 => PrimalBoundMode::None,
            1 => PrimalBoundMode::Optimum,
            _ => PrimalBoundMode::OptimumOne,
        };
        let skipping_mode = match params.find("SkippingMode", &SkippingMode::NAMES)? {
            0 => SkippingMode::SkipByNode,
            _ => SkippingMode::SkipByLevel,
        };
        let con_elim_mode = match params.find("ConstraintEliminationMode", &ConElimMode::NAMES)? {
            0 => ConElimMode::None,
            1 => ConElimMode::NonBinding,
            _ => ConElimMode::Basic,
        };
        let var_elim_mode = match params.find("VariableEliminationMode", &VarElimMode::NAMES)? {
            0 => VarElimMode::None,
            _ => VarElimMode::ReducedCost,
        };
        let vbc_mode = match params.find("VbcLog", &VbcMode::NAMES)? {
            0 => VbcMode::None,
            1 => VbcMode::File,
            _ => VbcMode::Pipe,
        };
        let default_lp_solver = params
            .get_raw("DefaultLpSolver")
            .unwrap_or("DenseSimplex")
            .to_string();
        if default_lp_solver != "DenseSimplex" {
            return Err(Error::illegal_parameter(format!(
                "DefaultLpSolver: unknown engine '{default_lp_solver}'"
            )));
        }

        Ok(Self {
            enumeration_strategy,
            branching_strategy,
            n_branching_candidates: params.get_ranged("NBranchingVariableCandidates", 1, I::MAX)?,
            n_strong_branching_iterations: params.get::<I>("NStrongBranchingIterations")?,
            required_guarantee: params.get_ranged("Guarantee", 0.0, tol.infinity)?,
            max_level: params.get_ranged("MaxLevel", 1, I::MAX)?,
            max_n_sub: params.get_ranged("MaxNSub", 1, I::MAX)?,
            max_cpu_secs: params.get_time("MaxCpuTime")?,
            max_cow_secs: params.get_time("MaxCowTime")?,
            obj_integer: params.get("ObjInteger")?,
            tailoff_n_lps: params.get::<I>("TailOffNLps")?,
            tailoff_percent: params.get_ranged("TailOffPercent", 0.0, tol.infinity)?,
            db_threshold: params.get::<I>("DelayedBranchingThreshold")?,
            min_dormant_rounds: params.get_ranged("MinDormantRounds", 1, I::MAX)?,
            output_level: output_level_from(params.find("OutputLevel", &OutputLevel::NAMES)?),
            log_level: output_level_from(params.find("LogLevel", &OutputLevel::NAMES)?),
            pb_mode,
            pricing_freq: params.get::<I>("PricingFrequency")?,
            skip_factor: params.get::<I>("SkipFactor")?,
            skipping_mode,
            fix_set_by_red_cost: params.get("FixSetByRedCost")?,
            print_lp: params.get("PrintLP")?,
            max_con_add: params.get::<I>("MaxConAdd")?,
            max_con_buffered: params.get::<I>("MaxConBuffered")?,
            max_var_add: params.get::<I>("MaxVarAdd")?,
            max_var_buffered: params.get::<I>("MaxVarBuffered")?,
            max_iterations: params.get::<i64>("MaxIterations")?,
            eliminate_fixed_set: params.get("EliminateFixedSet")?,
            new_root_reoptimize: params.get("NewRootReOptimize")?,
            optimum_file: params.get_raw("OptimumFileName").map(str::to_string),
            show_average_cut_distance: params.get("ShowAverageCutDistance")?,
            con_elim_mode,
            con_elim_eps: params.get_ranged("ConElimEps", 0.0, tol.infinity)?,
            con_elim_age: params.get_ranged("ConElimAge", 1, I::MAX)?,
            var_elim_mode,
            var_elim_eps: params.get_ranged("VarElimEps", 0.0, tol.infinity)?,
            var_elim_age: params.get_ranged("VarElimAge", 1, I::MAX)?,
            vbc_mode,
            default_lp_solver,
            solve_approx: params.get("SolveApprox")?,
        })
    }
}

/// The top-level coordinator of a branch-and-cut optimization.
pub struct Master<M: Model> {
    pub(crate) model: M,
    pub(crate) tol: Tol,
    pub(crate) sense: Sense,
    pub(crate) params: Parameters,
    pub(crate) config: Config,
    pub(crate) cutting: bool,
    pub(crate) pricing: bool,
    pub(crate) status: Status,
    pub(crate) primal_bound: E,
    pub(crate) dual_bound: E,
    pub(crate) root_dual_bound: E,
    pub(crate) con_pool: StandardPool<dyn Constraint>,
    pub(crate) cut_pool: NonDuplPool<dyn Constraint>,
    pub(crate) var_pool: StandardPool<dyn Variable>,
    pub(crate) initial_con_refs: Vec<PoolSlotRef<dyn Constraint>>,
    pub(crate) initial_var_refs: Vec<PoolSlotRef<dyn Variable>>,
    pub(crate) pools_initialized: bool,
    pub(crate) open_subs: OpenSubs,
    pub(crate) history: History,
    pub(crate) fix_cand: FixCand,
    pub(crate) fix_cand_root: Option<I>,
    pub(crate) global_fs: HashMap<I, FsVarStat>,
    pub(crate) subs: Vec<Option<Sub>>,
    pub(crate) root: Option<I>,
    pub(crate) r_root: Option<I>,
    pub(crate) callback: Box<dyn Callback>,
    pub(crate) tree_log: TreeLog,
    pub(crate) terminators: MultipleTerminators,
    pub(crate) log_file: Option<fs::File>,
    pub(crate) start_time: Instant,
    pub(crate) max_level_hit: bool,
    pub(crate) last_error: Option<Error>,
    // statistics
    pub(crate) n_sub: I,
    pub(crate) n_sub_selected: I,
    pub(crate) n_lp: I,
    pub(crate) highest_level: I,
    pub(crate) n_fixed: I,
    pub(crate) n_add_cons: I,
    pub(crate) n_rem_cons: I,
    pub(crate) n_add_vars: I,
    pub(crate) n_rem_vars: I,
    pub(crate) n_new_root: I,
}

impl<M: Model> Master<M> {
    /// A master over `model`. `cutting` and `pricing` enable the
    /// separation and pricing phases of the subproblem optimization.
    pub fn new(model: M, cutting: bool, pricing: bool) -> Self {
        Self::with_parameters(model, cutting, pricing, Parameters::new())
    }

    pub fn with_parameters(model: M, cutting: bool, pricing: bool, params: Parameters) -> Self {
        let tol = Tol::default();
        let sense = model.sense();
        let config =
            Config::from_params(&Parameters::new(), tol).expect("default parameters are consistent");
        Self {
            model,
            tol,
            sense,
            params,
            config,
            cutting,
            pricing,
            status: Status::Unprocessed,
            primal_bound: if sense.min() { tol.infinity } else { -tol.infinity },
            dual_bound: if sense.min() { -tol.infinity } else { tol.infinity },
            root_dual_bound: if sense.min() { -tol.infinity } else { tol.infinity },
            con_pool: StandardPool::new(0, true),
            cut_pool: NonDuplPool::new(0, true),
            var_pool: StandardPool::new(0, true),
            initial_con_refs: Vec::new(),
            initial_var_refs: Vec::new(),
            pools_initialized: false,
            open_subs: OpenSubs::new(sense, tol.infinity),
            history: History::new(),
            fix_cand: FixCand::new(),
            fix_cand_root: None,
            global_fs: HashMap::new(),
            subs: Vec::new(),
            root: None,
            r_root: None,
            callback: Box::new(NoOpCallback {}),
            tree_log: TreeLog::disabled(),
            terminators: MultipleTerminators::new(Vec::new()),
            log_file: None,
            start_time: Instant::now(),
            max_level_hit: false,
            last_error: None,
            n_sub: 0,
            n_sub_selected: 0,
            n_lp: 0,
            highest_level: 0,
            n_fixed: 0,
            n_add_cons: 0,
            n_rem_cons: 0,
            n_add_vars: 0,
            n_rem_vars: 0,
            n_new_root: 0,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn set_callback(&mut self, callback: Box<dyn Callback>) {
        self.callback = callback;
    }

    pub fn set_tree_log(&mut self, tree_log: TreeLog) {
        self.tree_log = tree_log;
    }

    /// Registers an additional termination gate, polled between two
    /// subproblems.
    pub fn add_terminator(&mut self, terminator: Box<dyn Terminator>) {
        self.terminators.push(terminator);
    }

    /// Constructs the three pools and seeds them with the initial
    /// formulation and cuts. A cut pool too small for the initial cuts
    /// is an error even when it could grow, because growth may first
    /// evict exactly those cuts.
    pub fn initialize_pools(
        &mut self,
        constraints: Vec<ConRc>,
        cuts: Vec<ConRc>,
        variables: Vec<VarRc>,
        var_pool_size: I,
        cut_pool_size: I,
        dynamic_cut_pool: bool,
    ) -> Result<()> {
        if cuts.len() > cut_pool_size {
            return Err(Error::illegal_parameter(format!(
                "cut pool of size {cut_pool_size} cannot hold {} initial cuts",
                cuts.len()
            )));
        }
        self.con_pool = StandardPool::new(constraints.len(), false);
        self.initial_con_refs = Vec::with_capacity(constraints.len());
        for con in constraints {
            let slot = self.con_pool.insert(con)?;
            self.initial_con_refs.push(slot);
        }

        // the variable pool always grows: being able to add a variable
        // is required for the correctness of pricing
        self.var_pool = StandardPool::new(var_pool_size.max(variables.len()).max(1), true);
        self.initial_var_refs = Vec::new();
        for var in variables {
            let slot = self.var_pool.insert(var)?;
            self.initial_var_refs.push(slot);
        }

        self.cut_pool = NonDuplPool::new(cut_pool_size.max(1), dynamic_cut_pool);
        for cut in cuts {
            self.cut_pool.insert(cut)?;
        }
        self.pools_initialized = true;
        Ok(())
    }

    /// Runs the branch-and-cut optimization.
    pub fn optimize(&mut self) -> Status {
        match self.do_optimize() {
            Ok(status) => status,
            Err(e) => {
                self.status = match e.kind() {
                    ErrorKind::Pool | ErrorKind::StandardPool => Status::OutOfMemory,
                    _ => Status::Error,
                };
                self.out(
                    &format!("optimization aborted: {e}"),
                    OutputLevel::Statistics,
                );
                self.last_error = Some(e);
                if let Some(root) = self.root {
                    self.fathom_the_subtree(root);
                }
                self.status
            }
        }
    }

    fn do_optimize(&mut self) -> Result<Status> {
        self.config = Config::from_params(&self.params, self.tol)?;
        self.start_time = Instant::now();
        self.terminators.initialize();

        if self.config.log_level > OutputLevel::Silent && self.log_file.is_none() {
            let name = format!("{}.log", self.model.problem_name());
            self.log_file = fs::File::create(&name).ok();
        }
        if self.tree_log.mode() == VbcMode::None {
            match self.config.vbc_mode {
                VbcMode::None => {}
                VbcMode::File => {
                    let name = format!("{}.tree", self.model.problem_name());
                    self.tree_log = TreeLog::to_file(&name).map_err(|e| {
                        Error::new(ErrorKind::Ostream, format!("cannot open tree log: {e}"))
                    })?;
                }
                VbcMode::Pipe => {
                    self.tree_log = TreeLog::to_pipe(Box::new(std::io::stdout()));
                }
            }
        }

        // initialize the bounds according to the sense of optimization
        self.primal_bound = if self.sense.min() {
            self.tol.infinity
        } else {
            -self.tol.infinity
        };
        self.dual_bound = -self.primal_bound;
        self.root_dual_bound = self.dual_bound;

        // depending on the primal bound mode, reinitialize from a known
        // optimum
        if self.config.pb_mode != PrimalBoundMode::None {
            if let Some(opt) = self.known_optimum() {
                self.primal_bound = match self.config.pb_mode {
                    PrimalBoundMode::Optimum => opt,
                    PrimalBoundMode::OptimumOne => {
                        if self.sense.max() {
                            opt - 1.0
                        } else {
                            opt + 1.0
                        }
                    }
                    PrimalBoundMode::None => self.primal_bound,
                };
            }
        }

        if !self.pools_initialized {
            let cons = self.model.initial_cons();
            let vars = self.model.initial_vars();
            let cuts = self.model.initial_cuts();
            let var_pool_size = 2 * vars.len() + 100;
            let cut_pool_size = cuts.len().max(500);
            self.initialize_pools(cons, cuts, vars, var_pool_size, cut_pool_size, true)?;
        }

        self.print_parameters();
        self.callback.on_event(&SearchEvent::Started);
        self.status = Status::Processing;

        let root_id = self.make_root();
        self.root = Some(root_id);
        self.r_root = Some(root_id);
        let root_bound = self.subs[root_id]
            .as_ref()
            .map(|s| s.dual_bound())
            .unwrap_or(self.dual_bound);
        self.open_subs.insert(root_id, root_bound);
        self.tree_log.new_node(0, root_id, 5);

        while let Some(id) = self.select() {
            self.n_sub_selected += 1;
            self.emit_sub_line(id);
            self.optimize_sub(id)?;
            self.update_r_root()?;
            self.refresh_dual_bound(None);
        }

        if self.status == Status::Processing {
            self.status = if self.max_level_hit {
                Status::MaxLevel
            } else {
                Status::Optimal
            };
        }

        // the gap closes when the search proved optimality
        if self.status == Status::Optimal && self.feasible_found() && self.better_dual(self.primal_bound)
        {
            self.update_dual_bound(self.primal_bound)?;
        }

        self.output_statistics();
        self.callback.on_event(&SearchEvent::Finished {
            status: self.status,
            primal_bound: self.primal_bound,
            dual_bound: self.dual_bound,
        });

        self.fix_cand.delete_all();
        self.fix_cand_root = None;
        self.tree_log.finish();
        Ok(self.status)
    }

    fn make_root(&mut self) -> I {
        let mut actcon: ActiveSet<dyn Constraint> = ActiveSet::new();
        for r in &self.initial_con_refs {
            actcon.insert(r.clone());
        }
        let mut actvar: ActiveSet<dyn Variable> = ActiveSet::new();
        for r in &self.initial_var_refs {
            actvar.insert(r.clone());
        }
        let root = Sub::root(
            actcon,
            actvar,
            self.sense,
            self.tol.infinity,
            self.config.tailoff_n_lps,
            self.config.tailoff_percent,
            self.config.max_con_buffered,
            self.config.max_var_buffered,
        );
        self.subs.push(Some(root));
        self.n_sub = 1;
        self.highest_level = 1;
        0
    }

    /// Checks the termination gates, then extracts the next node from
    /// the open set under the enumeration strategy.
    pub(crate) fn select(&mut self) -> Option<I> {
        if self.elapsed_secs() >= self.config.max_cpu_secs {
            self.stop_with(Status::MaxCpuTime, "maximal CPU time exceeded");
            return None;
        }
        if self.elapsed_secs() >= self.config.max_cow_secs {
            self.stop_with(Status::MaxCowTime, "maximal elapsed time exceeded");
            return None;
        }
        if self.guaranteed() {
            self.stop_with(Status::Guaranteed, "required guarantee reached");
            return None;
        }
        if self.n_sub_selected >= self.config.max_n_sub {
            self.stop_with(Status::MaxNSub, "maximal number of subproblems reached");
            return None;
        }
        if let Some(status) = self.terminators.terminate() {
            self.stop_with(status, "terminator tripped");
            return None;
        }

        let strategy = match self.config.enumeration_strategy {
            EnumStrategy::DiveAndBest => {
                if self.feasible_found() {
                    EnumStrategy::BestFirst
                } else {
                    EnumStrategy::DepthFirst
                }
            }
            s => s,
        };
        loop {
            let id = {
                let subs = &self.subs;
                let sense = self.sense;
                self.open_subs
                    .select(|a, b| compare_subs(subs, strategy, sense, a, b))?
            };
            // a freshly woken dormant node may have to rest longer
            let reshelve = {
                let sub = self.subs[id].as_ref()?;
                sub.status() == SubStatus::Dormant
                    && sub.dormant_rounds < self.config.min_dormant_rounds
            };
            if reshelve && !self.open_subs.is_empty() {
                if let Some(sub) = self.subs[id].as_mut() {
                    sub.dormant_rounds += 1;
                    let bound = sub.dual_bound();
                    self.open_subs.insert_dormant(id, bound);
                }
                continue;
            }
            return Some(id);
        }
    }

    fn stop_with(&mut self, status: Status, message: &str) {
        self.out(message, OutputLevel::Statistics);
        self.out("stop optimization", OutputLevel::Statistics);
        self.status = status;
        if let Some(root) = self.root {
            self.fathom_the_subtree(root);
        }
    }

    /// Fathoms every unfathomed node of the subtree rooted at `id`.
    pub(crate) fn fathom_the_subtree(&mut self, id: I) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(sub) = self.subs[current].as_mut() {
                stack.extend(sub.children.iter().copied());
                if sub.status() != SubStatus::Fathomed {
                    sub.status = SubStatus::Fathomed;
                    sub.release();
                    self.open_subs.remove(current);
                    self.tree_log.paint_node(current, 1);
                }
            }
        }
    }

    /// The LP engine chosen by the `DefaultLpSolver` parameter.
    pub(crate) fn new_lp_solver(&self) -> Box<dyn LpSolver> {
        Box::new(DenseSimplex::new(self.tol))
    }

    // ---- bounds ----------------------------------------------------

    pub fn primal_bound(&self) -> E {
        self.primal_bound
    }

    pub fn dual_bound(&self) -> E {
        self.dual_bound
    }

    pub fn root_dual_bound(&self) -> E {
        self.root_dual_bound
    }

    /// Sets a new primal bound. Worsening the bound is an error; under
    /// an integer objective the value is rounded toward the next
    /// integer before storage.
    pub fn update_primal_bound(&mut self, mut x: E) -> Result<()> {
        let worse = match self.sense {
            Sense::Max => x < self.primal_bound,
            Sense::Min => x > self.primal_bound,
        };
        if worse {
            return Err(Error::new(
                ErrorKind::PrimalBound,
                format!(
                    "bound worsened: old {} new {x}",
                    self.primal_bound
                ),
            ));
        }
        if self.config.obj_integer {
            if !self.tol.is_integer_eps(x, self.tol.eps) {
                return Err(Error::new(
                    ErrorKind::NotInteger,
                    format!("primal bound {x} is fractional for an integer objective"),
                ));
            }
            x = if self.sense.min() {
                (x + self.tol.eps).floor()
            } else {
                (x - self.tol.eps).ceil()
            };
        }
        self.primal_bound = x;
        if self.sense.max() {
            self.tree_log.lower_bound(x);
        } else {
            self.tree_log.upper_bound(x);
        }
        self.history
            .update(self.elapsed_secs() as E, self.primal_bound, self.dual_bound);
        Ok(())
    }

    /// Sets a new dual bound; worsening the bound is an error.
    pub fn update_dual_bound(&mut self, x: E) -> Result<()> {
        let worse = match self.sense {
            Sense::Max => x > self.dual_bound,
            Sense::Min => x < self.dual_bound,
        };
        if worse {
            return Err(Error::new(
                ErrorKind::DualBound,
                format!("bound worsened: old {} new {x}", self.dual_bound),
            ));
        }
        self.dual_bound = x;
        if self.sense.max() {
            self.tree_log.upper_bound(x);
        } else {
            self.tree_log.lower_bound(x);
        }
        self.history
            .update(self.elapsed_secs() as E, self.primal_bound, self.dual_bound);
        Ok(())
    }

    /// Recomputes the global dual bound from the open nodes (plus the
    /// bound of the node currently being processed, if any). The bound
    /// never crosses the primal bound: once the remaining tree cannot
    /// contain anything better, the gap is closed.
    pub(crate) fn refresh_dual_bound(&mut self, processing: Option<E>) {
        let open = self.open_subs.dual_bound();
        let candidate = match (open, processing) {
            (Some(o), Some(p)) => {
                if self.sense.min() {
                    o.min(p)
                } else {
                    o.max(p)
                }
            }
            (Some(o), None) => o,
            (None, Some(p)) => p,
            (None, None) => return,
        };
        let candidate = if self.sense.min() {
            candidate.min(self.primal_bound)
        } else {
            candidate.max(self.primal_bound)
        };
        if self.better_dual(candidate) {
            // the candidate only moves toward the primal bound, so the
            // monotone setter cannot fail here
            let _ = self.update_dual_bound(candidate);
        }
    }

    /// True if `x` would improve the global dual bound.
    pub fn better_dual(&self, x: E) -> bool {
        match self.sense {
            Sense::Max => x < self.dual_bound,
            Sense::Min => x > self.dual_bound,
        }
    }

    /// True if a subproblem with dual bound `x` cannot contain a better
    /// solution than the current primal bound.
    pub fn primal_violated(&self, x: E) -> bool {
        match self.sense {
            Sense::Max => {
                if self.config.obj_integer {
                    x <= self.primal_bound
                } else {
                    x + self.tol.eps <= self.primal_bound
                }
            }
            Sense::Min => {
                if self.config.obj_integer {
                    x >= self.primal_bound
                } else {
                    x - self.tol.eps >= self.primal_bound
                }
            }
        }
    }

    /// True if `x` would improve the primal bound.
    pub fn better_primal(&self, x: E) -> bool {
        match self.sense {
            Sense::Max => x > self.primal_bound,
            Sense::Min => x < self.primal_bound,
        }
    }

    /// True once any feasible solution has been found (or a primal
    /// bound was injected).
    pub fn feasible_found(&self) -> bool {
        match self.sense {
            Sense::Max => self.primal_bound > -self.tol.infinity,
            Sense::Min => self.primal_bound < self.tol.infinity,
        }
    }

    /// The lower bound on the optimum (sense-dependent).
    pub fn lower_bound(&self) -> E {
        if self.sense.min() {
            self.dual_bound
        } else {
            self.primal_bound
        }
    }

    /// The upper bound on the optimum (sense-dependent).
    pub fn upper_bound(&self) -> E {
        if self.sense.min() {
            self.primal_bound
        } else {
            self.dual_bound
        }
    }

    /// The relative gap between the bounds in percent. Undefined when
    /// the lower bound is zero and the upper bound is not.
    pub fn guarantee(&self) -> Result<E> {
        let lb = self.lower_bound();
        let ub = self.upper_bound();
        if lb.abs() < self.tol.machine_eps {
            if ub.abs() < self.tol.machine_eps {
                return Ok(0.0);
            }
            return Err(Error::new(
                ErrorKind::Guarantee,
                "cannot compute the guarantee with lower bound 0",
            ));
        }
        Ok(((ub - lb) / lb * 100.0).abs())
    }

    /// True once the gap dropped below the required guarantee.
    pub fn guaranteed(&self) -> bool {
        let lb = self.lower_bound();
        let ub = self.upper_bound();
        if lb.abs() < self.tol.machine_eps && ub.abs() > self.tol.machine_eps {
            return false;
        }
        match self.guarantee() {
            Ok(g) => g + self.tol.machine_eps < self.config.required_guarantee,
            Err(_) => false,
        }
    }

    /// Whether branching may be delayed further after `n_opt`
    /// processing rounds of a node.
    pub(crate) fn delayed_branching(&self, n_opt: I) -> bool {
        n_opt < self.config.db_threshold + 1
    }

    // ---- remaining-tree root ---------------------------------------

    /// Moves the root of the remaining tree and optionally reoptimizes
    /// the new root right away.
    pub fn r_root(&mut self, new_root: I, reoptimize: bool) -> Result<()> {
        if self.r_root == Some(new_root) {
            return Ok(());
        }
        self.r_root = Some(new_root);
        self.fix_cand_root = None;
        self.n_new_root += 1;
        self.out(
            &format!("subproblem {new_root} is now root of remaining tree"),
            OutputLevel::Subproblem,
        );
        let status = self.subs[new_root].as_ref().map(|s| s.status());
        if reoptimize
            && self.config.new_root_reoptimize
            && matches!(status, Some(SubStatus::Dormant) | Some(SubStatus::Unprocessed))
        {
            self.open_subs.remove(new_root);
            self.optimize_sub(new_root)?;
        }
        Ok(())
    }

    /// Walks the remaining-tree root downward while exactly one child
    /// subtree stays alive.
    pub(crate) fn update_r_root(&mut self) -> Result<()> {
        let Some(mut r) = self.r_root else {
            return Ok(());
        };
        loop {
            let Some(sub) = self.subs[r].as_ref() else {
                break;
            };
            if !matches!(sub.status(), SubStatus::Processed | SubStatus::Fathomed) {
                break;
            }
            let live: Vec<I> = sub
                .children
                .iter()
                .copied()
                .filter(|&c| self.subtree_alive(c))
                .collect();
            if live.len() != 1 {
                break;
            }
            r = live[0];
        }
        if Some(r) != self.r_root {
            self.r_root(r, true)?;
        }
        Ok(())
    }

    /// True if the subtree rooted at `id` contains any unfinished node.
    fn subtree_alive(&self, id: I) -> bool {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(sub) = self.subs[current].as_ref() {
                match sub.status() {
                    SubStatus::Unprocessed | SubStatus::Processing | SubStatus::Dormant => {
                        return true;
                    }
                    SubStatus::Processed => stack.extend(sub.children.iter().copied()),
                    SubStatus::Fathomed => {}
                }
            }
        }
        false
    }

    // ---- optimum file ----------------------------------------------

    /// Looks the problem up in the optimum-verification file.
    pub fn known_optimum(&self) -> Option<E> {
        let path = self.config.optimum_file.as_ref()?;
        let text = fs::read_to_string(path).ok()?;
        let problem = self.model.problem_name();
        for line in text.lines() {
            let mut it = line.split_whitespace();
            let (Some(name), Some(value)) = (it.next(), it.next()) else {
                continue;
            };
            if problem.ends_with(name) {
                return value.parse().ok();
            }
        }
        None
    }

    /// Verifies the final primal bound against the known optimum.
    pub fn check(&self) -> bool {
        let Some(opt) = self.known_optimum() else {
            return false;
        };
        opt - self.tol.eps < self.primal_bound && self.primal_bound < opt + self.tol.eps
    }

    // ---- output ----------------------------------------------------

    pub(crate) fn elapsed_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub(crate) fn out(&mut self, text: &str, min_level: OutputLevel) {
        if self.config.output_level >= min_level && self.config.output_level > OutputLevel::Silent {
            println!("{text}");
        }
        if self.config.log_level >= min_level && self.config.log_level > OutputLevel::Silent {
            if let Some(f) = &mut self.log_file {
                let _ = writeln!(f, "{text}");
            }
        }
    }

    fn print_parameters(&mut self) {
        let mut table: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        table.sort();
        let mut text = String::from("Branch and Cut Parameters:\n");
        for (k, v) in table {
            text.push_str(&format!("  {k:<32} : {v}\n"));
        }
        self.out(&text, OutputLevel::Statistics);
    }

    fn output_statistics(&mut self) {
        let history = self.history.to_string();
        self.out(&history, OutputLevel::Statistics);
        let mut stats = String::from("Miscellaneous Statistics\n");
        stats.push_str(&format!(
            "  Dual bound of the root node   : {}\n",
            self.root_dual_bound
        ));
        stats.push_str(&format!(
            "  Number of subproblems         : {}\n",
            self.n_sub_selected
        ));
        stats.push_str(&format!("  Number of solved LPs          : {}\n", self.n_lp));
        stats.push_str(&format!(
            "  Highest level in tree         : {}\n",
            self.highest_level
        ));
        stats.push_str(&format!("  Number of fixed variables     : {}\n", self.n_fixed));
        stats.push_str(&format!(
            "  Number of added constraints   : {}\n",
            self.n_add_cons
        ));
        stats.push_str(&format!(
            "  Number of removed constraints : {}\n",
            self.n_rem_cons
        ));
        stats.push_str(&format!(
            "  Number of added variables     : {}\n",
            self.n_add_vars
        ));
        stats.push_str(&format!(
            "  Number of removed variables   : {}\n",
            self.n_rem_vars
        ));
        stats.push_str(&format!(
            "  Number of root changes        : {}\n",
            self.n_new_root
        ));
        stats.push_str(&format!(
            "  Elapsed time (s)              : {}",
            self.elapsed_secs()
        ));
        self.out(&stats, OutputLevel::Statistics);
        if self.feasible_found() {
            self.out(
                &format!("Best solution: {}", self.primal_bound),
                OutputLevel::Statistics,
            );
        } else {
            self.out("No feasible solution found.", OutputLevel::Statistics);
        }
        self.out(
            &format!("optimization terminated with status {:?}", self.status),
            OutputLevel::Statistics,
        );
    }

    fn emit_sub_line(&mut self, id: I) {
        let event = SearchEvent::SubproblemSelected {
            n_sub: self.n_sub_selected,
            n_open: self.open_subs.n_open(),
            id,
            dual_bound: self.dual_bound,
            primal_bound: self.primal_bound,
        };
        self.callback.on_event(&event);
    }

    // ---- accessors -------------------------------------------------

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn tol(&self) -> Tol {
        self.tol
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn n_sub(&self) -> I {
        self.n_sub
    }

    pub fn n_sub_selected(&self) -> I {
        self.n_sub_selected
    }

    pub fn n_lp(&self) -> I {
        self.n_lp
    }

    pub fn n_fixed(&self) -> I {
        self.n_fixed
    }

    pub fn highest_level(&self) -> I {
        self.highest_level
    }

    pub fn n_add_cons(&self) -> I {
        self.n_add_cons
    }

    pub fn n_rem_cons(&self) -> I {
        self.n_rem_cons
    }

    pub fn n_add_vars(&self) -> I {
        self.n_add_vars
    }

    pub fn n_rem_vars(&self) -> I {
        self.n_rem_vars
    }

    pub fn sub(&self, id: I) -> Option<&Sub> {
        self.subs.get(id).and_then(Option::as_ref)
    }
}

/// Orders two open nodes under the enumeration strategy; `Greater`
/// means the first node is selected first.
pub(crate) fn compare_subs(
    subs: &[Option<Sub>],
    strategy: EnumStrategy,
    sense: Sense,
    a: I,
    b: I,
) -> Ordering {
    let (Some(sa), Some(sb)) = (subs[a].as_ref(), subs[b].as_ref()) else {
        return Ordering::Equal;
    };
    let ord = match strategy {
        EnumStrategy::BestFirst | EnumStrategy::DiveAndBest => best_first(sa, sb, sense),
        EnumStrategy::BreadthFirst => sb
            .level()
            .cmp(&sa.level())
            .then_with(|| sb.id().cmp(&sa.id())),
        EnumStrategy::DepthFirst => sa
            .level()
            .cmp(&sb.level())
            .then_with(|| equal_sub_compare(sa, sb)),
    };
    ord.then_with(|| sb.id().cmp(&sa.id()))
}

fn best_first(sa: &Sub, sb: &Sub, sense: Sense) -> Ordering {
    let da = sa.dual_bound();
    let db = sb.dual_bound();
    let ord = if sense.min() {
        db.partial_cmp(&da).unwrap_or(Ordering::Equal)
    } else {
        da.partial_cmp(&db).unwrap_or(Ordering::Equal)
    };
    ord.then_with(|| equal_sub_compare(sa, sb))
}

/// The tie-breaker between equally ranked nodes: the child produced by
/// setting its branching variable to the upper bound is preferred.
fn equal_sub_compare(sa: &Sub, sb: &Sub) -> Ordering {
    use crate::branching::BranchRuleOps;

    let (Some(ra), Some(rb)) = (sa.branch_rule(), sb.branch_rule()) else {
        return Ordering::Equal;
    };
    if !ra.branch_on_set_var() || !rb.branch_on_set_var() {
        return Ordering::Equal;
    }
    match (ra.set_to_upper_bound(), rb.set_to_upper_bound()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
