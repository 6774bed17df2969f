use std::sync::Arc;

use probus_error::{ProbusResult, RequestError};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::{
    dispatcher::Dispatcher,
    pubsub::{FanOutReport, Notification, Registration, Topic},
};

/// Тело запроса.
enum Body<'a> {
    Empty,
    Form(&'a [(&'a str, &'a str)]),
    Text(String),
}

/// Клиент удалённого процесса модели.
///
/// Одноразовые запросы request/response поверх HTTP. Успешные изменяющие
/// запросы запускают устаревшую рассылку «обновитесь» через диспетчер.
/// Подписки делегируются диспетчеру, поэтому клиент и есть «хост» для
/// слушателей.
pub struct ModelClient {
    http: reqwest::Client,
    base_url: Url,
    dispatcher: Arc<Dispatcher>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ModelClient {
    pub fn new(
        base_url: Url,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, dispatcher)
    }

    pub fn with_client(
        http: reqwest::Client,
        mut base_url: Url,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http,
            base_url,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn add_listener<F>(
        &self,
        topic: impl Into<Topic>,
        callback: F,
    ) -> Registration
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.dispatcher.add_listener(topic, callback)
    }

    pub fn update_listeners(&self) -> FanOutReport {
        self.dispatcher.update_listeners()
    }

    /// Создаёт новую модель.
    pub async fn new_model(&self) -> ProbusResult<()> {
        self.send(Method::POST, "model", Body::Empty).await?;
        self.refresh("model");
        Ok(())
    }

    pub async fn save_project(&self) -> ProbusResult<()> {
        self.send(Method::POST, "project", Body::Empty).await?;
        Ok(())
    }

    pub async fn workflow(
        &self,
        path: &str,
    ) -> ProbusResult<Value> {
        self.get_json(&format!("workflow/{}", relative(path))).await
    }

    pub async fn structure(
        &self,
        path: &str,
    ) -> ProbusResult<Value> {
        self.get_json(&format!("structure/{}", relative(path))).await
    }

    pub async fn components(&self) -> ProbusResult<Value> {
        self.get_json("components").await
    }

    pub async fn connections(
        &self,
        path: &str,
    ) -> ProbusResult<Value> {
        self.get_json(&format!("connections/{}", relative(path))).await
    }

    pub async fn files(&self) -> ProbusResult<Value> {
        self.get_json("files").await
    }

    /// Содержимое файла как текст.
    pub async fn file(
        &self,
        path: &str,
    ) -> ProbusResult<String> {
        Ok(self
            .send(Method::GET, &format!("file/{}", relative(path)), Body::Empty)
            .await?)
    }

    pub async fn set_file(
        &self,
        path: &str,
        contents: impl Into<String>,
    ) -> ProbusResult<()> {
        let target = format!("file/{}", relative(path));
        self.send(Method::PUT, &target, Body::Text(contents.into()))
            .await?;
        self.refresh(&target);
        Ok(())
    }

    pub async fn remove_file(
        &self,
        path: &str,
    ) -> ProbusResult<()> {
        let target = format!("file/{}", relative(path));
        self.send(Method::DELETE, &target, Body::Empty).await?;
        self.refresh(&target);
        Ok(())
    }

    /// Выполняет команду в удалённом процессе и возвращает её ответ.
    pub async fn issue_command(
        &self,
        command: &str,
    ) -> ProbusResult<String> {
        let reply = self
            .send(Method::POST, "command", Body::Form(&[("command", command)]))
            .await?;
        self.refresh("command");
        Ok(reply)
    }

    pub async fn run_model(&self) -> ProbusResult<String> {
        let reply = self.send(Method::POST, "exec", Body::Empty).await?;
        self.refresh("exec");
        Ok(reply)
    }

    pub async fn exec_file(
        &self,
        path: &str,
    ) -> ProbusResult<String> {
        let reply = self
            .send(Method::POST, "exec", Body::Form(&[("filename", path)]))
            .await?;
        self.refresh("exec");
        Ok(reply)
    }

    /// Просит удалённый процесс завершиться.
    pub async fn exit(&self) -> ProbusResult<()> {
        self.send(Method::POST, "exit", Body::Empty).await?;
        Ok(())
    }

    async fn get_json(
        &self,
        path: &str,
    ) -> ProbusResult<Value> {
        let text = self.send(Method::GET, path, Body::Empty).await?;
        let value = serde_json::from_str(&text).map_err(|e| RequestError::InvalidBody {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(value)
    }

    fn refresh(
        &self,
        path: &str,
    ) {
        let report = self.dispatcher.update_listeners();
        debug!(path, delivered = report.delivered, "Listeners refreshed after request");
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Body<'_>,
    ) -> Result<String, RequestError> {
        let url = self.base_url.join(path).map_err(|e| RequestError::InvalidUrl {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        trace!(%method, %url, "Sending request");

        let request = self.http.request(method, url);
        let request = match body {
            Body::Empty => request,
            Body::Form(fields) => request.form(fields),
            Body::Text(text) => request.body(text),
        };

        let transport = |e: reqwest::Error| RequestError::Transport {
            path: path.to_string(),
            reason: e.to_string(),
        };
        let response = request.send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response.text().await.map_err(transport)
    }
}

/// Путь ресурса без ведущего `/`, иначе `Url::join` отбросит базовый путь.
fn relative(path: &str) -> &str {
    path.trim_start_matches('/')
}
