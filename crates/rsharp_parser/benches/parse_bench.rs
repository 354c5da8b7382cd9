use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rsharp_parser::parse_text;

// A medium-size C# source with various constructs
const CSHARP_SOURCE: &str = r#"
using System;
using System.Collections.Generic;
using System.Linq;

namespace Shop.Orders
{
    public enum OrderState { Open, Paid, Shipped, Cancelled }

    public interface IRepository<T> where T : class
    {
        T Find(int id);
        IEnumerable<T> All();
        void Add(T item);
    }

    /// <summary>An order line.</summary>
    public struct Line
    {
        public readonly string Sku;
        public readonly int Quantity;
        public readonly decimal Price;

        public Line(string sku, int quantity, decimal price)
        {
            Sku = sku;
            Quantity = quantity;
            Price = price;
        }

        public decimal Total => Quantity * Price;
    }

    public class Order
    {
        private readonly List<Line> lines = new List<Line>();

        public int Id { get; private set; }
        public OrderState State { get; set; } = OrderState.Open;
        public event EventHandler Changed;

        public Order(int id) { Id = id; }

        public void Add(Line line)
        {
            if (State != OrderState.Open)
                throw new InvalidOperationException("closed");
            lines.Add(line);
            if (Changed != null) Changed(this, EventArgs.Empty);
        }

        public decimal Total()
        {
            decimal sum = 0;
            foreach (var line in lines)
            {
                sum += line.Total;
            }
            return sum;
        }

        public static Order operator +(Order order, Line line)
        {
            order.Add(line);
            return order;
        }
    }

    public class OrderRepository : IRepository<Order>
    {
        private readonly Dictionary<int, Order> orders = new Dictionary<int, Order>();

        public Order Find(int id)
        {
            Order order;
            return orders.TryGetValue(id, out order) ? order : null;
        }

        public IEnumerable<Order> All() => orders.Values;

        public void Add(Order item) { orders[item.Id] = item; }

        public IEnumerable<string> Expensive(decimal limit)
        {
            return from o in orders.Values
                   where o.Total() > limit
                   orderby o.Id descending
                   select "#" + o.Id;
        }

        public int Count(Func<Order, bool> predicate)
        {
            int count = 0;
            for (int i = 0; i < orders.Count; i++)
            {
                switch (orders[i].State)
                {
                    case OrderState.Paid:
                    case OrderState.Shipped:
                        if (predicate(orders[i])) count++;
                        break;
                    default:
                        continue;
                }
            }
            return count;
        }
    }
}
"#;

fn bench_parse_csharp(c: &mut Criterion) {
    c.bench_function("parse_csharp_medium", |b| {
        b.iter(|| {
            let result = parse_text("bench.cs", black_box(CSHARP_SOURCE), std::iter::empty::<&str>());
            black_box(result)
        });
    });
}

criterion_group!(benches, bench_parse_csharp);
criterion_main!(benches);
