//! 路由：根据刚完成的节点与当前状态决定下一步

use crate::config::ResearchConfig;
use crate::generator::nodes::NodeKind;
use crate::generator::state::AgentState;

/// 下一步要执行的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Node(NodeKind),
    Completed,
}

/// 路由结果；`advance`为真时引擎需先结束当前段落再执行下一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub next: Next,
    pub advance: bool,
}

impl Route {
    fn to(kind: NodeKind) -> Self {
        Self {
            next: Next::Node(kind),
            advance: false,
        }
    }

    fn advance_to(kind: NodeKind) -> Self {
        Self {
            next: Next::Node(kind),
            advance: true,
        }
    }
}

/// 纯函数，不修改状态
pub fn route(finished: NodeKind, state: &AgentState, config: &ResearchConfig) -> Route {
    match finished {
        NodeKind::Structure => {
            if state.paragraphs.is_empty() {
                Route::to(NodeKind::Format)
            } else {
                Route::to(NodeKind::Search)
            }
        }
        NodeKind::Search => Route::to(NodeKind::Summarize),
        NodeKind::ReflectSearch => Route::to(NodeKind::ReflectSummarize),
        NodeKind::Summarize | NodeKind::ReflectSummarize => after_summary(state, config),
        NodeKind::Format => Route {
            next: Next::Completed,
            advance: false,
        },
    }
}

/// 段落总结之后：还有反思预算就继续反思，否则进入下一段落或格式化
fn after_summary(state: &AgentState, config: &ResearchConfig) -> Route {
    let Some(paragraph) = state.current_paragraph() else {
        return Route::to(NodeKind::Format);
    };

    if paragraph.reflection_count < config.max_reflections {
        return Route::to(NodeKind::ReflectSearch);
    }

    if state.current_paragraph_index + 1 < state.paragraphs.len() {
        Route::advance_to(NodeKind::Search)
    } else {
        Route::advance_to(NodeKind::Format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::state::{ParagraphState, StateDelta};

    fn state_with_sections(n: usize) -> AgentState {
        let mut state = AgentState::new("query", None);
        state.apply(StateDelta::Structure {
            report_title: "Title".to_string(),
            paragraphs: (0..n)
                .map(|i| ParagraphState::new(format!("S{}", i), ""))
                .collect(),
        });
        state
    }

    fn config(max_reflections: usize) -> ResearchConfig {
        ResearchConfig {
            max_reflections,
            ..Default::default()
        }
    }

    #[test]
    fn test_structure_routes_to_search() {
        let state = state_with_sections(2);
        assert_eq!(
            route(NodeKind::Structure, &state, &config(1)),
            Route::to(NodeKind::Search)
        );
    }

    #[test]
    fn test_zero_sections_go_straight_to_format() {
        let state = state_with_sections(0);
        assert_eq!(
            route(NodeKind::Structure, &state, &config(1)),
            Route::to(NodeKind::Format)
        );
    }

    #[test]
    fn test_fixed_edges() {
        let state = state_with_sections(1);
        let cfg = config(1);
        assert_eq!(
            route(NodeKind::Search, &state, &cfg),
            Route::to(NodeKind::Summarize)
        );
        assert_eq!(
            route(NodeKind::ReflectSearch, &state, &cfg),
            Route::to(NodeKind::ReflectSummarize)
        );
        assert_eq!(route(NodeKind::Format, &state, &cfg).next, Next::Completed);
    }

    #[test]
    fn test_reflection_budget_keeps_section_open() {
        let mut state = state_with_sections(2);
        state.paragraphs[0].reflection_count = 1;
        assert_eq!(
            route(NodeKind::ReflectSummarize, &state, &config(2)),
            Route::to(NodeKind::ReflectSearch)
        );
    }

    #[test]
    fn test_exhausted_budget_advances_to_next_section() {
        let mut state = state_with_sections(2);
        state.paragraphs[0].reflection_count = 2;
        assert_eq!(
            route(NodeKind::ReflectSummarize, &state, &config(2)),
            Route::advance_to(NodeKind::Search)
        );
    }

    #[test]
    fn test_zero_reflections_skip_reflection() {
        let state = state_with_sections(1);
        assert_eq!(
            route(NodeKind::Summarize, &state, &config(0)),
            Route::advance_to(NodeKind::Format)
        );
    }

    #[test]
    fn test_last_section_goes_to_format() {
        let mut state = state_with_sections(2);
        state.current_paragraph_index = 1;
        state.paragraphs[1].reflection_count = 1;
        assert_eq!(
            route(NodeKind::ReflectSummarize, &state, &config(1)),
            Route::advance_to(NodeKind::Format)
        );
    }
}
