/*!
Runtime support shared by every file `regexgen` generates (`spec.md` §4.7,
new in the expanded spec).

This is the one crate `regexgen`'s *output* depends on. It carries no
pattern-specific logic — everything that varies per pattern is generated
inline — only the ambient pieces that would be absurd to regenerate for
every pattern: process-wide object pools for the Backtracking engine's
per-call scratch space (`spec.md` §5, "Shared resources"), the streaming
chunk buffer and cancellation token (`spec.md` §4.6/§5), and a couple of
ASCII character-class test functions referenced by generated `EmptyWidth`
checks.

Grounded on the pooling idiom `spec.md` §9 gestures at ("a lock-free stack
or a thread-local cache; lifetime is the program's") and on the teacher's
own `util::pool::Pool` (referenced throughout `meta/` for exactly this
purpose: per-call scratch reused across searches instead of allocated
fresh).
*/

pub mod ascii;
pub mod cancel;
pub mod chunk;
pub mod memchr;
pub mod pool;

pub use cancel::{CancellationToken, Cancelled};
pub use chunk::ChunkBuffer;
pub use memchr::memchr;
pub use pool::Pool;
