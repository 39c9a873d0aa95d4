//! 会话状态机
//!
//! 唯一的状态转换函数 `(state, event) -> Transition`，不做任何 IO。
//! 所有副作用以 `Effect` 列表返回，由协调器按顺序执行。

use crate::models::session::SessionState;

/// 驱动状态机的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// 会话数据加载成功
    Loaded,
    /// 开始手动保存
    SaveStarted,
    /// 手动保存完成（成功或失败）
    SaveFinished,
    /// 学生点击提交
    SubmitRequested,
    /// 计时器到期
    DeadlineReached,
    /// 违规升级
    IntegrityEscalated,
    FinalizeSucceeded,
    FinalizeFailed,
    /// 提交失败后手动重试
    RetryRequested,
    /// 学生主动退出
    ExitRequested,
}

/// 转换附带的副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// 启动计时器、自动保存并订阅诚信监控
    StartTimers,
    /// 尽力保存一次
    BestEffortSave,
    /// 停止计时器与自动保存、解除诚信监控订阅、冻结最终答案
    Teardown,
    /// 上报取消资格
    ReportDisqualification,
    /// 发起最终提交
    IssueFinalize,
}

/// 一次状态转换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    pub effects: &'static [Effect],
}

/// 状态转换函数
///
/// 返回 `None` 表示该事件在当前状态下被忽略，例如提交中再次点击提交、
/// 已提交后计时器到期等。
pub fn transition(state: SessionState, event: SessionEvent) -> Option<Transition> {
    use Effect::*;
    use SessionEvent::*;
    use SessionState::*;

    let (to, effects): (SessionState, &'static [Effect]) = match (state, event) {
        (Loading, Loaded) => (Active, &[StartTimers]),
        (Loading, ExitRequested) => (Exited, &[]),

        (Active, SaveStarted) => (Saving, &[]),
        (Saving, SaveFinished) => (Active, &[]),

        (Active | Saving, SubmitRequested) => (ManualSubmitting, &[Teardown, IssueFinalize]),
        (Active | Saving, DeadlineReached) => (ForcedSubmitting, &[Teardown, IssueFinalize]),
        (Active | Saving, IntegrityEscalated) => (
            ForcedSubmitting,
            &[Teardown, ReportDisqualification, IssueFinalize],
        ),
        (Active | Saving, ExitRequested) => (Exited, &[BestEffortSave, Teardown]),

        (ManualSubmitting | ForcedSubmitting, FinalizeSucceeded) => (Submitted, &[]),
        (ManualSubmitting | ForcedSubmitting, FinalizeFailed) => (Failed, &[]),

        (Failed, RetryRequested) => (ManualSubmitting, &[IssueFinalize]),
        (Failed, ExitRequested) => (Exited, &[]),

        _ => return None,
    };

    Some(Transition {
        from: state,
        to,
        effects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [SessionState; 8] = [
        SessionState::Loading,
        SessionState::Active,
        SessionState::Saving,
        SessionState::ForcedSubmitting,
        SessionState::ManualSubmitting,
        SessionState::Submitted,
        SessionState::Failed,
        SessionState::Exited,
    ];

    const ALL_EVENTS: [SessionEvent; 10] = [
        SessionEvent::Loaded,
        SessionEvent::SaveStarted,
        SessionEvent::SaveFinished,
        SessionEvent::SubmitRequested,
        SessionEvent::DeadlineReached,
        SessionEvent::IntegrityEscalated,
        SessionEvent::FinalizeSucceeded,
        SessionEvent::FinalizeFailed,
        SessionEvent::RetryRequested,
        SessionEvent::ExitRequested,
    ];

    #[test]
    fn test_happy_path() {
        let t = transition(SessionState::Loading, SessionEvent::Loaded).unwrap();
        assert_eq!(t.to, SessionState::Active);
        assert_eq!(t.effects, &[Effect::StartTimers]);

        let t = transition(SessionState::Active, SessionEvent::SubmitRequested).unwrap();
        assert_eq!(t.to, SessionState::ManualSubmitting);
        // 先停止计时器，再发起提交
        assert_eq!(t.effects, &[Effect::Teardown, Effect::IssueFinalize]);

        let t = transition(t.to, SessionEvent::FinalizeSucceeded).unwrap();
        assert_eq!(t.to, SessionState::Submitted);
    }

    #[test]
    fn test_second_trigger_is_ignored_while_submitting() {
        for state in [SessionState::ManualSubmitting, SessionState::ForcedSubmitting] {
            for event in [
                SessionEvent::SubmitRequested,
                SessionEvent::DeadlineReached,
                SessionEvent::IntegrityEscalated,
                SessionEvent::RetryRequested,
                SessionEvent::ExitRequested,
            ] {
                assert!(transition(state, event).is_none(), "{:?} {:?}", state, event);
            }
        }
    }

    #[test]
    fn test_no_transition_reenters_active_after_submitting() {
        for state in ALL_STATES {
            if matches!(
                state,
                SessionState::Loading | SessionState::Active | SessionState::Saving
            ) {
                continue;
            }
            for event in ALL_EVENTS {
                if let Some(t) = transition(state, event) {
                    assert!(!t.to.is_answering(), "{:?} + {:?} -> {:?}", state, event, t.to);
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for event in ALL_EVENTS {
            assert!(transition(SessionState::Submitted, event).is_none());
            assert!(transition(SessionState::Exited, event).is_none());
        }
    }

    #[test]
    fn test_every_finalize_is_preceded_by_teardown() {
        for state in [SessionState::Active, SessionState::Saving] {
            for event in ALL_EVENTS {
                let Some(t) = transition(state, event) else {
                    continue;
                };
                if let Some(pos) = t.effects.iter().position(|e| *e == Effect::IssueFinalize) {
                    assert!(t.effects[..pos].contains(&Effect::Teardown));
                }
            }
        }
    }

    #[test]
    fn test_retry_only_from_failed() {
        let t = transition(SessionState::Failed, SessionEvent::RetryRequested).unwrap();
        assert_eq!(t.to, SessionState::ManualSubmitting);
        // 重试不会重新启动计时器
        assert_eq!(t.effects, &[Effect::IssueFinalize]);
        assert!(transition(SessionState::Active, SessionEvent::RetryRequested).is_none());
    }

    #[test]
    fn test_exit_saves_before_teardown() {
        let t = transition(SessionState::Saving, SessionEvent::ExitRequested).unwrap();
        assert_eq!(t.to, SessionState::Exited);
        assert_eq!(t.effects, &[Effect::BestEffortSave, Effect::Teardown]);
    }
}
