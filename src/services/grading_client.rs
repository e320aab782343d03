//! 远程评分客户端 - 业务能力层
//!
//! 只负责"评一个文件"能力：上传 → 等待处理 → 生成 → 解析 → 删除。
//! 每次调用恰好返回一个 `GradeOutcome`，任何一步失败都折叠为 `Failure`。

use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GradingError;
use crate::infrastructure::{FileState, GenerationSettings, RemoteBackend, RemoteFile};
use crate::models::GradeOutcome;
use crate::services::prompt::build_grading_prompt;
use crate::utils::logging::truncate_text;

/// 轮询策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// 两次查询之间的固定间隔
    pub interval: Duration,
    /// 超过该时间仍在处理则判定失败
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

impl From<&Config> for PollPolicy {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.poll_timeout(),
        }
    }
}

/// 远程评分客户端
///
/// 职责：
/// - 只处理单个文件
/// - 保证上传的远程文件在返回前被删除（尽力而为）
/// - 不出现 ResultTable / 行索引
pub struct GradingClient<B: RemoteBackend> {
    backend: B,
    settings: GenerationSettings,
    poll: PollPolicy,
}

impl<B: RemoteBackend> GradingClient<B> {
    pub fn new(backend: B, settings: GenerationSettings, poll: PollPolicy) -> Self {
        Self {
            backend,
            settings,
            poll,
        }
    }

    /// 使用配置中的生成参数与轮询策略
    pub fn from_config(backend: B, config: &Config) -> Self {
        Self::new(backend, GenerationSettings::from(config), PollPolicy::from(config))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn has_credentials(&self) -> bool {
        self.backend.has_credentials()
    }

    /// 评一个文件
    ///
    /// # 参数
    /// - `file_path`: 提交文件
    /// - `rubric`: 题目描述（评分标准）
    pub async fn grade(&self, file_path: &Path, rubric: &str) -> GradeOutcome {
        // 1. 上传
        let uploaded = match self.backend.upload(file_path).await {
            Ok(file) => file,
            Err(e) => return GradingError::Upload(format!("{:#}", e)).into(),
        };
        debug!("已上传 {} → {}", file_path.display(), uploaded.name);

        let outcome = match self.evaluate(uploaded.clone(), rubric).await {
            Ok(data) => GradeOutcome::Success { data },
            Err(e) => e.into(),
        };

        // 5. 无论成功与否都删除远程文件
        if let Err(e) = self.backend.delete(&uploaded.name).await {
            warn!("⚠️ 删除远程文件 {} 失败: {:#}", uploaded.name, e);
        }

        outcome
    }

    async fn evaluate(
        &self,
        uploaded: RemoteFile,
        rubric: &str,
    ) -> Result<Vec<crate::models::ExerciseResult>, GradingError> {
        // 2. 等待远程处理完成
        let ready = self.wait_until_ready(uploaded).await?;

        // 3. 生成评分
        let prompt = build_grading_prompt(rubric);
        let response = self
            .backend
            .generate(&prompt, &ready, &self.settings)
            .await
            .map_err(|e| GradingError::Generate(format!("{:#}", e)))?;
        debug!("模型响应: {}", truncate_text(&response, 200));

        // 4. 解析
        GradeOutcome::parse_response(&response)
    }

    async fn wait_until_ready(&self, mut file: RemoteFile) -> Result<RemoteFile, GradingError> {
        let deadline = Instant::now() + self.poll.timeout;

        while file.state == FileState::Processing {
            if Instant::now() >= deadline {
                return Err(GradingError::PollTimeout {
                    secs: self.poll.timeout.as_secs(),
                });
            }
            info!("⏳ 远程文件 {} 处理中...", file.name);
            sleep(self.poll.interval).await;
            file = self
                .backend
                .get(&file.name)
                .await
                .map_err(|e| GradingError::Remote(format!("{:#}", e)))?;
        }

        if file.state == FileState::Failed {
            return Err(GradingError::Processing(format!(
                "远程服务无法处理文件 {}",
                file.name
            )));
        }

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 每次 get 依次返回 `states` 中的状态
    struct StubBackend {
        states: Mutex<Vec<FileState>>,
        response: String,
        fail_delete: bool,
        deleted: Mutex<Vec<String>>,
    }

    impl StubBackend {
        fn new(states: Vec<FileState>, response: &str) -> Self {
            Self {
                states: Mutex::new(states),
                response: response.to_string(),
                fail_delete: false,
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn next_state(&self) -> FileState {
            let mut states = self.states.lock().unwrap();
            if states.len() > 1 {
                states.remove(0)
            } else {
                states[0]
            }
        }
    }

    #[async_trait]
    impl RemoteBackend for StubBackend {
        fn has_credentials(&self) -> bool {
            true
        }

        async fn upload(&self, _path: &Path) -> Result<RemoteFile> {
            Ok(RemoteFile {
                name: "files/stub".to_string(),
                uri: "stub://files/stub".to_string(),
                mime_type: "text/plain".to_string(),
                state: self.next_state(),
            })
        }

        async fn get(&self, name: &str) -> Result<RemoteFile> {
            Ok(RemoteFile {
                name: name.to_string(),
                uri: String::new(),
                mime_type: String::new(),
                state: self.next_state(),
            })
        }

        async fn generate(
            &self,
            _prompt: &str,
            _file: &RemoteFile,
            settings: &GenerationSettings,
        ) -> Result<String> {
            assert!(settings.json_output);
            Ok(self.response.clone())
        }

        async fn delete(&self, name: &str) -> Result<()> {
            self.deleted.lock().unwrap().push(name.to_string());
            if self.fail_delete {
                Err(anyhow!("delete refused"))
            } else {
                Ok(())
            }
        }
    }

    fn fast_poll() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_waits_while_processing() {
        let backend = StubBackend::new(
            vec![FileState::Processing, FileState::Processing, FileState::Ready],
            r#"[{"exercise_id": "1", "is_attempted": true, "feedback": "ok", "grade": 1}]"#,
        );
        let client = GradingClient::new(backend, GenerationSettings::default(), fast_poll());

        let outcome = client.grade(Path::new("a.py"), "1. hello").await;

        assert!(outcome.is_success());
        assert_eq!(*client.backend().deleted.lock().unwrap(), vec!["files/stub"]);
    }

    #[tokio::test]
    async fn test_failed_state_is_failure_and_cleaned_up() {
        let backend = StubBackend::new(vec![FileState::Processing, FileState::Failed], "[]");
        let client = GradingClient::new(backend, GenerationSettings::default(), fast_poll());

        let outcome = client.grade(Path::new("a.py"), "1. hello").await;

        match outcome {
            GradeOutcome::Failure { error } => assert!(error.contains("远程文件处理失败")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(client.backend().deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_poll_timeout() {
        let backend = StubBackend::new(vec![FileState::Processing], "[]");
        let client = GradingClient::new(backend, GenerationSettings::default(), fast_poll());

        let outcome = client.grade(Path::new("a.py"), "1. hello").await;

        assert_eq!(
            outcome,
            GradeOutcome::from(GradingError::PollTimeout { secs: 0 })
        );
        assert_eq!(client.backend().deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_change_outcome() {
        let mut backend = StubBackend::new(vec![FileState::Ready], "not json at all");
        backend.fail_delete = true;
        let client = GradingClient::new(backend, GenerationSettings::default(), fast_poll());

        let outcome = client.grade(Path::new("a.py"), "1. hello").await;

        match outcome {
            GradeOutcome::Failure { error } => assert!(error.contains("not json at all")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
