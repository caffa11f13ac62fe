/// Apply `transformer` to every item, spreading the work over up to `threads`
/// threads (all available cores when `threads` is 0).
///
/// Results are appended to `output` in the same order as `items`.
pub fn parallel_compute<In, Out, F>(items: &[In], output: &mut Vec<Out>, threads: usize, transformer: F)
where
    F: Fn(&In) -> Out,
    F: Send + Copy,
    In: Sync,
    Out: Send,
{
    let thread_count = match threads {
        0 => std::thread::available_parallelism().map_or(1, |count| count.get()),
        count => count,
    };

    // for small item counts, perform single-threaded
    if items.len() < thread_count || thread_count == 1 {
        output.extend(items.iter().map(transformer));
        return;
    }

    // multithreaded
    std::thread::scope(|s| {
        let chunks = items.chunks(items.len().div_ceil(thread_count));
        let mut threads = Vec::with_capacity(thread_count);

        for chunk in chunks {
            let thread = s.spawn(move || chunk.iter().map(transformer).collect::<Vec<Out>>());
            threads.push(thread);
        }

        for thread in threads {
            match thread.join() {
                Ok(chunk) => output.extend(chunk),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });
}
