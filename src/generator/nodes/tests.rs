#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use crate::config::ResearchConfig;
    use crate::error::ErrorKind;
    use crate::generator::nodes::NodeKind;
    use crate::generator::nodes::testing::{ScriptedLlm, ScriptedSearch, context_with};
    use crate::generator::state::{AgentState, ParagraphState, StateDelta};

    fn state_with_sections(n: usize) -> AgentState {
        let mut state = AgentState::new("electric vehicle subsidies", None);
        state.apply(StateDelta::Structure {
            report_title: "Report".to_string(),
            paragraphs: (0..n)
                .map(|i| ParagraphState::new(format!("S{}", i), "plan"))
                .collect(),
        });
        state
    }

    #[test]
    fn test_node_kind_names() {
        assert_eq!(NodeKind::Structure.to_string(), "structure");
        assert_eq!(NodeKind::Summarize.to_string(), "summary");
        assert_eq!(NodeKind::ReflectSearch.to_string(), "reflect");
        assert_eq!(NodeKind::ReflectSummarize.to_string(), "reflect_summary");
        assert_eq!(
            serde_json::to_value(NodeKind::ReflectSummarize).unwrap(),
            "reflect_summary"
        );
    }

    #[tokio::test]
    async fn test_structure_caps_sections() {
        let llm = Arc::new(ScriptedLlm::new(9));
        let ctx = context_with(
            llm,
            Arc::new(ScriptedSearch::ok()),
            ResearchConfig {
                max_sections: 4,
                ..Default::default()
            },
        );
        let state = AgentState::new("topic", None);

        let delta = NodeKind::Structure.run(&ctx, &state).await.unwrap();
        let StateDelta::Structure {
            report_title,
            paragraphs,
        } = delta
        else {
            panic!("expected structure delta");
        };
        assert_eq!(report_title, "Test Report");
        assert_eq!(paragraphs.len(), 4);
        assert!(paragraphs.iter().all(|p| !p.completed
            && p.reflection_count == 0
            && p.search_history.is_empty()
            && p.latest_summary.is_empty()));
    }

    #[tokio::test]
    async fn test_structure_schema_violation_is_fatal_kind() {
        let mut llm = ScriptedLlm::new(3);
        llm.malformed_structure = true;
        let ctx = context_with(
            Arc::new(llm),
            Arc::new(ScriptedSearch::ok()),
            ResearchConfig::default(),
        );

        let err = NodeKind::Structure
            .run(&ctx, &AgentState::new("topic", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::SchemaViolation);
        assert_eq!(err.node, NodeKind::Structure);
    }

    #[tokio::test]
    async fn test_search_appends_seed_record() {
        let search = Arc::new(ScriptedSearch::ok());
        let ctx = context_with(
            Arc::new(ScriptedLlm::new(1)),
            search.clone(),
            ResearchConfig {
                max_search_results: 2,
                ..Default::default()
            },
        );
        let state = state_with_sections(1);

        let delta = NodeKind::Search.run(&ctx, &state).await.unwrap();
        let StateDelta::AppendSearch { record, reflective } = delta else {
            panic!("expected search delta");
        };
        assert!(!reflective);
        assert_eq!(record.results.len(), 2);
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_empty_results() {
        let ctx = context_with(
            Arc::new(ScriptedLlm::new(1)),
            Arc::new(ScriptedSearch::failing()),
            ResearchConfig::default(),
        );
        let mut state = state_with_sections(1);

        let delta = NodeKind::Search.run(&ctx, &state).await.unwrap();
        state.apply(delta);
        assert_eq!(state.paragraphs[0].search_history.len(), 1);
        assert!(state.paragraphs[0].search_history[0].results.is_empty());

        // the summary step still runs on missing evidence
        let delta = NodeKind::Summarize.run(&ctx, &state).await.unwrap();
        state.apply(delta);
        assert!(state.paragraphs[0].latest_summary.starts_with("summary-"));
    }

    #[tokio::test]
    async fn test_summaries_are_noops_without_search_history() {
        let llm = Arc::new(ScriptedLlm::new(1));
        let ctx = context_with(
            llm.clone(),
            Arc::new(ScriptedSearch::ok()),
            ResearchConfig::default(),
        );
        let state = state_with_sections(1);

        for kind in [NodeKind::Summarize, NodeKind::ReflectSummarize] {
            let delta = kind.run(&ctx, &state).await.unwrap();
            assert_eq!(delta, StateDelta::Unchanged);
            let mut after = state.clone();
            after.apply(delta);
            assert_eq!(after, state);
        }
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_reflection_search_persists_record_and_counts() {
        let ctx = context_with(
            Arc::new(ScriptedLlm::new(1)),
            Arc::new(ScriptedSearch::ok()),
            ResearchConfig::default(),
        );
        let mut state = state_with_sections(1);

        let delta = NodeKind::ReflectSearch.run(&ctx, &state).await.unwrap();
        state.apply(delta);
        assert_eq!(state.paragraphs[0].search_history.len(), 1);
        assert_eq!(state.paragraphs[0].reflection_count, 1);

        let delta = NodeKind::ReflectSummarize.run(&ctx, &state).await.unwrap();
        state.apply(delta);
        assert!(state.paragraphs[0].latest_summary.starts_with("updated-"));
        assert_eq!(
            state.paragraphs[0].content,
            state.paragraphs[0].latest_summary
        );
    }

    #[tokio::test]
    async fn test_format_strips_fences_and_reasoning() {
        let mut llm = ScriptedLlm::new(1);
        llm.report_body = "<think>plan</think>\n```markdown\n## Findings\ntext\n```".to_string();
        let ctx = context_with(
            Arc::new(llm),
            Arc::new(ScriptedSearch::ok()),
            ResearchConfig::default(),
        );
        let mut state = state_with_sections(1);

        let delta = NodeKind::Format.run(&ctx, &state).await.unwrap();
        assert_eq!(
            delta,
            StateDelta::Report {
                body: "## Findings\ntext".to_string()
            }
        );
        state.apply(delta);
        assert_eq!(
            state.final_report.as_deref(),
            Some("# Report\n\n## Findings\ntext")
        );
        assert!(state.completed);
    }
}
