use futures::{
    FutureExt, Stream, StreamExt,
    stream::{self, BoxStream, select_all},
};

/// A deferred side effect that produces zero or more messages.
///
/// Commands are how queries, mutations and cache invalidations are handed to
/// whatever drives the application's update loop. Nothing runs until the
/// command's stream is polled.
///
/// # Examples
///
/// ```
/// use pawhub_sync::command::Command;
///
/// enum Message {
///     GotResult(i32),
/// }
///
/// let cmd = Command::perform(async { 42 }, Message::GotResult);
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) stream: Option<BoxStream<'static, Msg>>,
}

impl<Msg: Send + 'static> Command<Msg> {
    /// Create a command that does nothing.
    ///
    /// ```
    /// use pawhub_sync::command::Command;
    ///
    /// let cmd: Command<i32> = Command::none();
    /// assert!(cmd.is_none());
    /// ```
    #[must_use]
    pub fn none() -> Self {
        Self { stream: None }
    }

    /// Perform an asynchronous operation and convert its result to a message.
    ///
    /// ```
    /// use pawhub_sync::command::Command;
    ///
    /// async fn fetch_data() -> String {
    ///     "data".to_string()
    /// }
    ///
    /// enum Message {
    ///     DataReceived(String),
    /// }
    ///
    /// let cmd = Command::perform(fetch_data(), Message::DataReceived);
    /// ```
    pub fn perform<A>(
        future: impl Future<Output = A> + Send + 'static,
        f: impl FnOnce(A) -> Msg + Send + 'static,
    ) -> Self {
        Self::future(future.map(f))
    }

    /// Create a command from a future that produces a message.
    pub fn future(future: impl Future<Output = Msg> + Send + 'static) -> Self {
        Self {
            stream: Some(future.into_stream().boxed()),
        }
    }

    /// Create a command that emits `msg` immediately.
    pub fn message(msg: Msg) -> Self {
        Self {
            stream: Some(stream::once(async move { msg }).boxed()),
        }
    }

    /// Batch multiple commands into a single command.
    ///
    /// All commands run concurrently and message order is not guaranteed.
    /// `Command::none()` entries are dropped.
    ///
    /// ```
    /// use pawhub_sync::command::Command;
    ///
    /// enum Message {
    ///     First(i32),
    ///     Second(String),
    /// }
    ///
    /// let cmd = Command::batch(vec![
    ///     Command::perform(async { 1 }, Message::First),
    ///     Command::perform(async { "data".to_string() }, Message::Second),
    ///     Command::none(),
    /// ]);
    /// ```
    pub fn batch(commands: impl IntoIterator<Item = Command<Msg>>) -> Self {
        let streams: Vec<_> = commands.into_iter().filter_map(|cmd| cmd.stream).collect();

        if streams.is_empty() {
            Self::none()
        } else {
            Self {
                stream: Some(select_all(streams).boxed()),
            }
        }
    }

    /// Create a command from a stream of messages.
    pub fn stream(stream: impl Stream<Item = Msg> + Send + 'static) -> Self {
        Self {
            stream: Some(stream.boxed()),
        }
    }

    /// Run a stream and convert each item to a message.
    pub fn run<A>(
        stream: impl Stream<Item = A> + Send + 'static,
        f: impl Fn(A) -> Msg + Send + 'static,
    ) -> Self {
        Self::stream(stream.map(f))
    }

    /// Converts the messages of this command into another type.
    #[must_use]
    pub fn map<T: Send + 'static>(self, f: impl Fn(Msg) -> T + Send + 'static) -> Command<T> {
        Command {
            stream: self.stream.map(|s| s.map(f).boxed()),
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.stream.is_none()
    }

    /// The stream of messages, or `None` for `Command::none()`.
    #[must_use]
    pub fn into_stream(self) -> Option<BoxStream<'static, Msg>> {
        self.stream
    }
}

impl<Msg: Send + 'static> Default for Command<Msg> {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_empty() {
        let cmd: Command<i32> = Command::batch(vec![]);
        assert!(cmd.is_none());
    }

    #[tokio::test]
    async fn test_batch_single_command() {
        let cmd = Command::batch(vec![Command::future(async { 1 })]);

        let mut stream = cmd.into_stream().expect("stream should exist");
        assert_eq!(stream.next().await, Some(1));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_batch_with_none_commands() {
        let cmd = Command::batch(vec![
            Command::future(async { 1 }),
            Command::<i32>::none(),
            Command::future(async { 3 }),
        ]);

        let mut results: Vec<i32> = cmd
            .into_stream()
            .expect("stream should exist")
            .collect()
            .await;

        // Order may vary due to concurrent execution
        results.sort_unstable();
        assert_eq!(results, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_batch_all_none() {
        let cmd = Command::batch(vec![Command::<i32>::none(), Command::<i32>::none()]);
        assert!(cmd.is_none());
    }

    #[tokio::test]
    async fn test_run() {
        let cmd = Command::run(stream::iter(vec![1, 2, 3]), |x| x * 2);
        let results: Vec<i32> = cmd
            .into_stream()
            .expect("stream should exist")
            .collect()
            .await;
        assert_eq!(results, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_map() {
        #[derive(Debug, PartialEq)]
        enum Message {
            Number(i32),
        }

        let cmd = Command::message(7).map(Message::Number);
        let results: Vec<Message> = cmd
            .into_stream()
            .expect("stream should exist")
            .collect()
            .await;
        assert_eq!(results, vec![Message::Number(7)]);
    }

    #[test]
    fn test_map_none_stays_none() {
        let cmd: Command<String> = Command::<i32>::none().map(|n| n.to_string());
        assert!(cmd.is_none());
    }
}
