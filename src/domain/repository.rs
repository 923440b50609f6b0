use std::sync::Arc;

/// 永続化の抽象。文字列値を固定キーで読み書きするだけのスロット。Infra層が実装する。
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns `None` when nothing was ever written under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Overwrites the whole value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    type Error = T::Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }
}
