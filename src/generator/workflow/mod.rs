use futures::{Stream, StreamExt, stream};
use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{Instrument, Span, debug, info, info_span};
use uuid::Uuid;

use crate::error::ResearchError;
use crate::generator::nodes::{NodeContext, NodeKind};
use crate::generator::router::{Next, route};
use crate::generator::state::{AgentState, StateDelta};

/// 时间跟踪作用域，按节点类型累计耗时
pub struct TimingScope {
    start_time: Instant,
    node_durations: HashMap<NodeKind, Duration>,
    node_runs: HashMap<NodeKind, usize>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub const NODE_ORDER: [NodeKind; 6] = [
        NodeKind::Structure,
        NodeKind::Search,
        NodeKind::Summarize,
        NodeKind::ReflectSearch,
        NodeKind::ReflectSummarize,
        NodeKind::Format,
    ];

    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            node_durations: HashMap::new(),
            node_runs: HashMap::new(),
        }
    }

    /// 记录一次节点执行
    pub fn record(&mut self, node: NodeKind, duration: Duration) {
        *self.node_durations.entry(node).or_default() += duration;
        *self.node_runs.entry(node).or_default() += 1;
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn get_node_duration(&self, node: NodeKind) -> Option<Duration> {
        self.node_durations.get(&node).copied()
    }

    pub fn get_node_runs(&self, node: NodeKind) -> usize {
        self.node_runs.get(&node).copied().unwrap_or(0)
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.node_durations.is_empty() {
            report.push_str("\n各节点执行时间:\n");
            for node in Self::NODE_ORDER {
                if let Some(duration) = self.get_node_duration(node) {
                    report.push_str(&format!(
                        "- {} ×{}: {:.3}秒\n",
                        node,
                        self.get_node_runs(node),
                        duration.as_secs_f64()
                    ));
                }
            }
        }

        report
    }
}

/// 进度事件：每执行一个节点产出一个，最后以`Completed`结束
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Node { node: NodeKind, state: AgentState },
    Completed { report: String, run_time: Duration },
}

impl ProgressEvent {
    /// 事件的节点名，结束事件为`completed`
    pub fn node_name(&self) -> String {
        match self {
            ProgressEvent::Node { node, .. } => node.to_string(),
            ProgressEvent::Completed { .. } => "completed".to_string(),
        }
    }
}

impl Serialize for ProgressEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("node", &self.node_name())?;
        match self {
            ProgressEvent::Node { state, .. } => {
                map.serialize_entry("state", state)?;
            }
            ProgressEvent::Completed { report, run_time } => {
                map.serialize_entry("report", report)?;
                map.serialize_entry("run_time", &run_time.as_secs_f64())?;
            }
        }
        map.end()
    }
}

/// 一次完整运行的结果
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub report: String,
    pub run_time: Duration,
    pub state: AgentState,
}

/// 研究引擎：驱动节点与路由，直到生成最终报告
pub struct ResearchEngine {
    ctx: NodeContext,
    query: String,
    context: Option<Value>,
}

impl ResearchEngine {
    pub fn new(ctx: NodeContext, query: impl Into<String>, context: Option<Value>) -> Self {
        Self {
            ctx,
            query: query.into(),
            context,
        }
    }

    /// 惰性的进度事件流
    ///
    /// 只有在消费者拉取下一个事件时才会执行下一个节点；丢弃流即取消运行，
    /// 正在进行的网关调用随之被丢弃。出现错误后流立即结束。
    pub fn stream(self) -> impl Stream<Item = Result<ProgressEvent, ResearchError>> + Send {
        let seed = self
            .ctx
            .config
            .validate()
            .map_err(ResearchError::InvalidConfig)
            .map(|_| Run::new(self));

        stream::unfold(Some(seed), |seed| async move {
            match seed? {
                Err(e) => Some((Err(e), None)),
                Ok(mut run) => match run.step().await {
                    Ok(Some(event)) => Some((Ok(event), Some(Ok(run)))),
                    Ok(None) => None,
                    Err(e) => {
                        run.span.in_scope(|| info!(error = %e, "research aborted"));
                        Some((Err(e), None))
                    }
                },
            }
        })
    }

    /// 消费整个事件流并返回最终报告
    pub async fn run(self) -> Result<ResearchOutcome, ResearchError> {
        let mut events = Box::pin(self.stream());
        let mut last_state = AgentState::default();

        while let Some(event) = events.next().await {
            match event? {
                ProgressEvent::Node { state, .. } => last_state = state,
                ProgressEvent::Completed { report, run_time } => {
                    return Ok(ResearchOutcome {
                        report,
                        run_time,
                        state: last_state,
                    });
                }
            }
        }

        Err(ResearchError::EmptyFinalReport)
    }
}

/// 单次运行的内部状态，由引擎独占
struct Run {
    ctx: NodeContext,
    state: AgentState,
    next: Option<Next>,
    steps: usize,
    timing: TimingScope,
    span: Span,
}

impl Run {
    fn new(engine: ResearchEngine) -> Self {
        let run_id = Uuid::new_v4();
        let span = info_span!("research", run_id = %run_id, query = %engine.query);
        span.in_scope(|| {
            info!(
                max_reflections = engine.ctx.config.max_reflections,
                step_limit = engine.ctx.config.step_limit,
                "research started"
            )
        });

        Self {
            state: AgentState::new(engine.query, engine.context),
            ctx: engine.ctx,
            next: Some(Next::Node(NodeKind::Structure)),
            steps: 0,
            timing: TimingScope::new(),
            span,
        }
    }

    async fn step(&mut self) -> Result<Option<ProgressEvent>, ResearchError> {
        let kind = match self.next {
            None => return Ok(None),
            Some(Next::Completed) => {
                self.next = None;
                return Ok(Some(self.complete()));
            }
            Some(Next::Node(kind)) => kind,
        };

        let limit = self.ctx.config.step_limit;
        if self.steps >= limit {
            self.next = None;
            return Err(ResearchError::StepLimitExceeded { limit });
        }
        self.steps += 1;

        let node_span = info_span!(parent: &self.span, "node", node = %kind, step = self.steps);
        let started = Instant::now();
        let delta = kind
            .run(&self.ctx, &self.state)
            .instrument(node_span.clone())
            .await?;
        let elapsed = started.elapsed();
        self.timing.record(kind, elapsed);

        if kind == NodeKind::Format
            && !matches!(&delta, StateDelta::Report { body } if !body.trim().is_empty())
        {
            return Err(ResearchError::EmptyFinalReport);
        }

        self.state.apply(delta);
        let next = route(kind, &self.state, &self.ctx.config);
        if next.advance {
            self.state.advance_paragraph();
        }
        self.next = Some(next.next);

        node_span.in_scope(|| {
            info!(
                paragraph = self.state.current_paragraph_index,
                paragraphs = self.state.paragraphs.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "node finished"
            );
            debug!(next = ?next.next, advance = next.advance, "routed");
        });

        Ok(Some(ProgressEvent::Node {
            node: kind,
            state: self.state.clone(),
        }))
    }

    fn complete(&self) -> ProgressEvent {
        let run_time = self.timing.get_total_duration();
        self.span.in_scope(|| {
            info!(
                steps = self.steps,
                run_time_secs = run_time.as_secs_f64(),
                "research completed"
            );
            debug!("{}", self.timing.generate_timing_report());
        });

        ProgressEvent::Completed {
            report: self.state.final_report.clone().unwrap_or_default(),
            run_time,
        }
    }
}
