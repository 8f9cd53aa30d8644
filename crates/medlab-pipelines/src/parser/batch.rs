//! Size-bounded batching over fallible row streams.

/// Groups the `Ok` items of a row stream into vectors of at most `size` rows.
///
/// A trailing partial batch is still yielded; an empty one never is. The first
/// `Err` is passed through in place of the batch being collected, whose rows
/// are dropped, and nothing is yielded after it.
#[derive(Debug)]
pub struct Batches<I> {
    inner: I,
    size: usize,
    done: bool,
}

impl<I> Batches<I> {
    pub fn new(inner: I, size: usize) -> Self {
        Self {
            inner,
            size: size.max(1),
            done: false,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.size
    }
}

impl<I, T, E> Iterator for Batches<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size.min(1024));
        while batch.len() < self.size {
            match self.inner.next() {
                Some(Ok(row)) => batch.push(row),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                },
                None => {
                    self.done = true;
                    break;
                },
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

pub trait BatchExt: Iterator + Sized {
    fn batches(self, size: usize) -> Batches<Self> {
        Batches::new(self, size)
    }
}

impl<I: Iterator> BatchExt for I {}
